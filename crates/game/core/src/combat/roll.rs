//! Damage and crit rolls.

use crate::action::AttackCommand;
use crate::env::DiceRoller;

/// Exclusive upper bound of the crit roll; crit chances share this scale.
pub const CRIT_ROLL_CEILING: u32 = 100;

/// Rolls a hit and returns the finalized copy.
///
/// ```text
/// resolved   = resolved_damage, or uniform [min, max] when 0
/// multiplier = crit_multiplier, or 1 when unset (0)
/// crit_roll  = uniform [0, ceiling)
/// if crit_roll > crit_chance: multiplier = 1
/// result     = ceil(resolved * multiplier)
/// ```
///
/// A roll equal to the chance crits, so a chance of 0 still crits on a zero
/// draw; [`AttackCommand::NEVER_CRIT`] rules crits out entirely.
pub fn finalize_hit(cmd: &AttackCommand, roller: &mut DiceRoller, ceiling: u32) -> AttackCommand {
    let mut hit = cmd.clone();

    let resolved = if hit.resolved_damage == 0 {
        roller.roll_range(hit.min_damage, hit.max_damage)
    } else {
        hit.resolved_damage
    };

    let mut multiplier = if hit.crit_multiplier == 0.0 {
        1.0
    } else {
        hit.crit_multiplier
    };

    let crit_roll = roller.roll_below(ceiling) as i64;
    let critical = crit_roll <= i64::from(hit.crit_chance) && hit.crit_multiplier != 0.0;
    if crit_roll > i64::from(hit.crit_chance) {
        multiplier = 1.0;
    }

    hit.resolved_damage = (resolved as f32 * multiplier).ceil() as u32;
    hit.critical = critical;
    hit
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::action::{EffectKind, Issuer, TargetingMode};
    use crate::env::RngOracle;

    /// Oracle that always draws the lowest value.
    struct ZeroRng;

    impl RngOracle for ZeroRng {
        fn next_u32(&self, _seed: u64) -> u32 {
            0
        }
    }

    /// Oracle that always draws the highest value.
    struct MaxRng;

    impl RngOracle for MaxRng {
        fn next_u32(&self, _seed: u64) -> u32 {
            u32::MAX
        }
    }

    fn strike() -> AttackCommand {
        AttackCommand::new(
            "strike",
            TargetingMode::PreChosen,
            EffectKind::Damage,
            Issuer::Player,
            "FriendlyFront1".into(),
        )
        .with_damage(5, 5)
        .with_crit(0, 0.0)
    }

    #[test]
    fn unset_multiplier_keeps_rolled_damage() {
        let mut roller = DiceRoller::new(Arc::new(ZeroRng), 0);
        let hit = finalize_hit(&strike(), &mut roller, CRIT_ROLL_CEILING);
        assert_eq!(hit.resolved_damage, 5);
        assert!(!hit.critical);
    }

    #[test]
    fn zero_chance_crits_on_zero_draw() {
        let cmd = strike().with_crit(0, 1.5);
        let mut roller = DiceRoller::new(Arc::new(ZeroRng), 0);
        let hit = finalize_hit(&cmd, &mut roller, CRIT_ROLL_CEILING);
        assert_eq!(hit.resolved_damage, 8);
        assert!(hit.critical);
    }

    #[test]
    fn roll_above_chance_never_crits() {
        let cmd = strike().with_crit(50, 2.0);
        // u32::MAX % 100 == 95
        let mut roller = DiceRoller::new(Arc::new(MaxRng), 0);
        let hit = finalize_hit(&cmd, &mut roller, CRIT_ROLL_CEILING);
        assert_eq!(hit.resolved_damage, 5);
        assert!(!hit.critical);
    }

    #[test]
    fn never_crit_sentinel_blocks_zero_draw() {
        let cmd = strike().with_crit(AttackCommand::NEVER_CRIT, 3.0);
        let mut roller = DiceRoller::new(Arc::new(ZeroRng), 0);
        let hit = finalize_hit(&cmd, &mut roller, CRIT_ROLL_CEILING);
        assert_eq!(hit.resolved_damage, 5);
    }

    #[test]
    fn pre_resolved_amount_is_not_rerolled() {
        let cmd = strike().with_damage(1, 100).with_fixed_amount(7);
        let mut roller = DiceRoller::seeded(11);
        let hit = finalize_hit(&cmd, &mut roller, CRIT_ROLL_CEILING);
        assert_eq!(hit.resolved_damage, 7);
    }

    #[test]
    fn rolled_damage_stays_within_bounds() {
        let cmd = strike().with_damage(2, 9).with_crit(AttackCommand::NEVER_CRIT, 0.0);
        let mut roller = DiceRoller::seeded(5);
        for _ in 0..100 {
            let hit = finalize_hit(&cmd, &mut roller, CRIT_ROLL_CEILING);
            assert!((2..=9).contains(&hit.resolved_damage));
        }
    }
}
