//! Asynchronous abstraction for sourcing combat intent.
//!
//! Runtime users plug in [`ActionProvider`] implementations so AI-controlled
//! combatants can act with scripted fixtures or AI policies, and a
//! [`TargetSelector`] so player-issued commands can wait for a human choice.
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use combat_core::{
    AttackCommand, CharacterId, CombatState, EffectKind, Faction, Issuer, Location,
    SpecialAbility, TargetingMode,
};

use super::errors::Result;

/// Trait for providing attacks based on the current combat state.
///
/// Different implementations can handle:
/// - Hostile and allied AI decisions
/// - Scripted/replayed attacks
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Provide an attack for `actor`, or `None` to pass.
    ///
    /// # Arguments
    /// * `actor` - The AI-controlled combatant that needs to act
    /// * `state` - Read-only snapshot of the current combat state
    async fn provide_attack(
        &self,
        actor: CharacterId,
        state: &CombatState,
    ) -> Result<Option<AttackCommand>>;
}

/// Issues a plain random-target strike using the actor's stat block.
///
/// Barrage carriers sweep every opponent; everyone else hits one random
/// opponent, front rank first.
pub struct BasicAttackProvider;

#[async_trait]
impl ActionProvider for BasicAttackProvider {
    async fn provide_attack(
        &self,
        actor: CharacterId,
        state: &CombatState,
    ) -> Result<Option<AttackCommand>> {
        let field = &state.battlefield;
        let Some(combatant) = field.character(actor).filter(|c| c.alive) else {
            return Ok(None);
        };
        let Some(location) = field.location_of(actor).cloned() else {
            return Ok(None);
        };

        let issuer = match combatant.faction {
            Faction::Hostile => Issuer::Ai,
            Faction::AiAlly | Faction::PlayerAlly => Issuer::AllyAi,
        };
        let name = if combatant.has_ability(&SpecialAbility::Barrage) {
            "Barrage"
        } else {
            "Attack"
        };
        let stats = &combatant.stats;
        let action_id = combatant.action_ids.first().copied().unwrap_or_default();

        let command = AttackCommand::new(
            name,
            TargetingMode::Random,
            EffectKind::Damage,
            issuer,
            location,
        )
        .with_damage(stats.min_damage, stats.max_damage)
        .with_crit(stats.crit_chance, stats.crit_multiplier)
        .with_action(action_id, 1);

        Ok(Some(command))
    }
}

/// Chooses one target for a player-issued command.
#[async_trait]
pub trait TargetSelector: Send + Sync {
    /// Returns the chosen target, or `None` to abandon the command.
    ///
    /// The future is dropped when the sequence is pre-empted.
    async fn select(&self, command: &AttackCommand, candidates: &[Location]) -> Option<Location>;
}

/// Always picks the first candidate.
pub struct FirstCandidateSelector;

#[async_trait]
impl TargetSelector for FirstCandidateSelector {
    async fn select(&self, _command: &AttackCommand, candidates: &[Location]) -> Option<Location> {
        candidates.first().cloned()
    }
}

/// Waits for choices pushed from a UI through a channel.
pub struct ChannelSelector {
    choices: Mutex<mpsc::Receiver<Location>>,
}

impl ChannelSelector {
    /// Creates the selector and the sender used to submit choices.
    pub fn channel(buffer: usize) -> (Self, mpsc::Sender<Location>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                choices: Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl TargetSelector for ChannelSelector {
    async fn select(&self, _command: &AttackCommand, candidates: &[Location]) -> Option<Location> {
        let mut choices = self.choices.lock().await;
        while let Some(choice) = choices.recv().await {
            if candidates.contains(&choice) {
                return Some(choice);
            }
            tracing::warn!(choice = choice.as_str(), "ignoring choice outside the candidates");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{BoardLayout, Combatant, StatBlock};

    #[tokio::test]
    async fn basic_attack_uses_actor_stats() {
        let mut state = CombatState::new(BoardLayout::default());
        let id = state.battlefield.allocate_id();
        let mut goblin = Combatant::new(id, "goblin", Faction::Hostile);
        goblin.apply_stats(StatBlock {
            max_health: 10,
            min_damage: 2,
            max_damage: 4,
            crit_chance: 5,
            crit_multiplier: 1.5,
            ..StatBlock::default()
        });
        assert!(state
            .battlefield
            .place(&Location::from("HostileFront1"), goblin));

        let cmd = BasicAttackProvider
            .provide_attack(id, &state)
            .await
            .unwrap()
            .expect("living actor attacks");
        assert_eq!(cmd.issuer, Issuer::Ai);
        assert_eq!(cmd.targeting, TargetingMode::Random);
        assert_eq!((cmd.min_damage, cmd.max_damage), (2, 4));
        assert_eq!(cmd.attacker, Location::from("HostileFront1"));
    }

    #[tokio::test]
    async fn fallen_actor_passes() {
        let mut state = CombatState::new(BoardLayout::default());
        let id = state.battlefield.allocate_id();
        assert!(state.battlefield.place(
            &Location::from("FriendlyFront1"),
            Combatant::new(id, "squire", Faction::AiAlly)
        ));
        state.battlefield.mark_fallen(id);

        let cmd = BasicAttackProvider.provide_attack(id, &state).await.unwrap();
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn channel_selector_skips_invalid_choices() {
        let (selector, tx) = ChannelSelector::channel(4);
        tx.send(Location::from("HostileBack2")).await.unwrap();
        tx.send(Location::from("HostileFront1")).await.unwrap();

        let cmd = AttackCommand::new(
            "Strike",
            TargetingMode::AnyHostile,
            EffectKind::Damage,
            Issuer::Player,
            Location::from("FriendlyFront1"),
        );
        let candidates = [Location::from("HostileFront1")];
        assert_eq!(
            selector.select(&cmd, &candidates).await,
            Some(Location::from("HostileFront1"))
        );
    }
}
