use crate::combat::CRIT_ROLL_CEILING;
use crate::state::BoardLayout;

/// Combat tuning constants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Turn after which a normal wave starts applying fatigue.
    pub fatigue_threshold: u32,
    /// Turn after which a boss wave starts applying fatigue.
    pub boss_fatigue_threshold: u32,
    /// Exclusive upper bound of the crit roll.
    pub crit_roll_ceiling: u32,
    pub layout: BoardLayout,
}

impl CombatConfig {
    pub const DEFAULT_FATIGUE_THRESHOLD: u32 = 12;
    pub const DEFAULT_BOSS_FATIGUE_THRESHOLD: u32 = 20;

    pub fn new() -> Self {
        Self {
            fatigue_threshold: Self::DEFAULT_FATIGUE_THRESHOLD,
            boss_fatigue_threshold: Self::DEFAULT_BOSS_FATIGUE_THRESHOLD,
            crit_roll_ceiling: CRIT_ROLL_CEILING,
            layout: BoardLayout::default(),
        }
    }

    pub fn fatigue_threshold(&self, boss_wave: bool) -> u32 {
        if boss_wave {
            self.boss_fatigue_threshold
        } else {
            self.fatigue_threshold
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
