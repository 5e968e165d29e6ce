//! Application of finalized hits to the battlefield.

use crate::action::{AttackCommand, EffectKind};
use crate::error::CombatError;
use crate::state::{Battlefield, CharacterId};

/// What a single applied hit did.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitReport {
    /// Combatant that actually received the effect (a guardian, when redirected).
    pub receiver: CharacterId,
    pub effect: EffectKind,
    /// Health removed or restored, or defence changed, after mitigation.
    pub amount: u32,
    pub redirected: bool,
    pub fell: bool,
}

/// Applies one finalized hit on `cmd.target`.
///
/// # Errors
///
/// - [`CombatError::SlotNotFound`] / [`CombatError::TargetMissing`] when the
///   target slot is unknown or empty
/// - [`CombatError::TargetFallen`] when the target is already dead
/// - [`CombatError::AttackerMissing`] for `Protect` without a living attacker
pub fn apply_hit(field: &mut Battlefield, cmd: &AttackCommand) -> Result<HitReport, CombatError> {
    if field.slot(&cmd.target).is_none() {
        return Err(CombatError::SlotNotFound(cmd.target.clone()));
    }
    let target = field
        .occupant(&cmd.target)
        .ok_or_else(|| CombatError::TargetMissing(cmd.target.clone()))?;
    if !target.alive {
        return Err(CombatError::TargetFallen(cmd.target.clone()));
    }
    let target_id = target.id;
    let amount = cmd.resolved_damage;

    match cmd.effect {
        EffectKind::Damage => Ok(apply_damage(field, target_id, amount)),
        EffectKind::Heal => {
            let c = combatant_mut(field, target_id)?;
            let before = c.health;
            c.health = c.health.saturating_add(amount).min(c.stats.max_health);
            Ok(report(target_id, cmd.effect, c.health - before))
        }
        EffectKind::BuffDefence => {
            let c = combatant_mut(field, target_id)?;
            c.defence = c.defence.saturating_add(amount);
            Ok(report(target_id, cmd.effect, amount))
        }
        EffectKind::DebuffDefence => {
            let c = combatant_mut(field, target_id)?;
            let before = c.defence;
            c.defence = c.defence.saturating_sub(amount);
            Ok(report(target_id, cmd.effect, before - c.defence))
        }
        EffectKind::Protect => {
            let guardian = field
                .occupant(&cmd.attacker)
                .filter(|c| c.alive)
                .map(|c| c.id)
                .ok_or_else(|| CombatError::AttackerMissing(cmd.attacker.clone()))?;
            combatant_mut(field, target_id)?.guardian = Some(guardian);
            Ok(report(target_id, cmd.effect, 0))
        }
    }
}

fn combatant_mut(
    field: &mut Battlefield,
    id: CharacterId,
) -> Result<&mut crate::state::Combatant, CombatError> {
    field
        .character_mut(id)
        .ok_or(CombatError::CharacterNotFound(id))
}

fn report(receiver: CharacterId, effect: EffectKind, amount: u32) -> HitReport {
    HitReport {
        receiver,
        effect,
        amount,
        redirected: false,
        fell: false,
    }
}

/// Damage goes to a living guardian when one is set, reduced by the
/// receiver's defence.
fn apply_damage(field: &mut Battlefield, target: CharacterId, amount: u32) -> HitReport {
    let guardian = field
        .character(target)
        .and_then(|c| c.guardian)
        .filter(|g| field.character(*g).is_some_and(|c| c.alive));
    let receiver = guardian.unwrap_or(target);

    let Some(c) = field.character_mut(receiver) else {
        return report(receiver, EffectKind::Damage, 0);
    };
    let dealt = amount.saturating_sub(c.defence).min(c.health);
    c.health -= dealt;
    let fell = c.health == 0;
    if fell {
        field.mark_fallen(receiver);
    }

    HitReport {
        receiver,
        effect: EffectKind::Damage,
        amount: dealt,
        redirected: guardian.is_some(),
        fell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Issuer, TargetingMode};
    use crate::state::{Combatant, Faction, Location, StatBlock};

    fn spawn(field: &mut Battlefield, key: &str, faction: Faction, health: u32, defence: u32) {
        let id = field.allocate_id();
        let mut c = Combatant::new(id, key, faction);
        c.apply_stats(StatBlock {
            max_health: health,
            defence,
            ..StatBlock::default()
        });
        assert!(field.place(&Location::from(key), c));
    }

    fn hit(effect: EffectKind, attacker: &str, target: &str, amount: u32) -> AttackCommand {
        AttackCommand::new("hit", TargetingMode::PreChosen, effect, Issuer::Player, attacker.into())
            .with_target(target.into())
            .with_fixed_amount(amount)
    }

    #[test]
    fn damage_is_reduced_by_defence_and_kills_at_zero() {
        let mut field = Battlefield::default();
        spawn(&mut field, "FriendlyFront1", Faction::PlayerAlly, 10, 0);
        spawn(&mut field, "HostileFront1", Faction::Hostile, 10, 3);

        let r = apply_hit(&mut field, &hit(EffectKind::Damage, "FriendlyFront1", "HostileFront1", 5))
            .unwrap();
        assert_eq!(r.amount, 2);
        assert!(!r.fell);

        let r = apply_hit(&mut field, &hit(EffectKind::Damage, "FriendlyFront1", "HostileFront1", 50))
            .unwrap();
        assert!(r.fell);
        assert!(!field.roster.has_hostiles());

        let err = apply_hit(&mut field, &hit(EffectKind::Damage, "FriendlyFront1", "HostileFront1", 1))
            .unwrap_err();
        assert_eq!(err, CombatError::TargetFallen("HostileFront1".into()));
    }

    #[test]
    fn heal_is_capped_at_max_health() {
        let mut field = Battlefield::default();
        spawn(&mut field, "FriendlyFront1", Faction::PlayerAlly, 10, 0);
        field.occupant_mut(&"FriendlyFront1".into()).unwrap().health = 7;

        let r = apply_hit(&mut field, &hit(EffectKind::Heal, "FriendlyFront1", "FriendlyFront1", 9))
            .unwrap();
        assert_eq!(r.amount, 3);
        assert_eq!(field.occupant(&"FriendlyFront1".into()).unwrap().health, 10);
    }

    #[test]
    fn defence_changes_saturate_at_zero() {
        let mut field = Battlefield::default();
        spawn(&mut field, "HostileMid1", Faction::Hostile, 10, 2);

        apply_hit(&mut field, &hit(EffectKind::DebuffDefence, "None", "HostileMid1", 5)).unwrap();
        assert_eq!(field.occupant(&"HostileMid1".into()).unwrap().defence, 0);

        apply_hit(&mut field, &hit(EffectKind::BuffDefence, "None", "HostileMid1", 4)).unwrap();
        assert_eq!(field.occupant(&"HostileMid1".into()).unwrap().defence, 4);
    }

    #[test]
    fn protected_target_redirects_damage_to_guardian() {
        let mut field = Battlefield::default();
        spawn(&mut field, "FriendlyFront1", Faction::PlayerAlly, 20, 0);
        spawn(&mut field, "FriendlyBack1", Faction::PlayerAlly, 5, 0);
        spawn(&mut field, "HostileFront1", Faction::Hostile, 10, 0);

        apply_hit(&mut field, &hit(EffectKind::Protect, "FriendlyFront1", "FriendlyBack1", 0))
            .unwrap();
        let r = apply_hit(&mut field, &hit(EffectKind::Damage, "HostileFront1", "FriendlyBack1", 8))
            .unwrap();

        assert!(r.redirected);
        assert_eq!(field.occupant(&"FriendlyFront1".into()).unwrap().health, 12);
        assert_eq!(field.occupant(&"FriendlyBack1".into()).unwrap().health, 5);
    }

    #[test]
    fn empty_target_slot_is_reported() {
        let mut field = Battlefield::default();
        let err = apply_hit(&mut field, &hit(EffectKind::Damage, "None", "HostileBack2", 3))
            .unwrap_err();
        assert_eq!(err, CombatError::TargetMissing("HostileBack2".into()));

        let err = apply_hit(&mut field, &hit(EffectKind::Damage, "None", "Nowhere", 3)).unwrap_err();
        assert_eq!(err, CombatError::SlotNotFound("Nowhere".into()));
    }
}
