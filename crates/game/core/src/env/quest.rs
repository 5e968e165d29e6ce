//! Quest and wave configuration capabilities.
//!
//! Quest data is external and read-only to the core. The engine only needs
//! to know whether a wave is a boss wave, so configuration records expose that
//! through [`HasBossFlag`] instead of being inspected field by field.

/// Narrow capability of a wave record.
pub trait HasBossFlag {
    fn is_boss(&self) -> bool;
}

impl HasBossFlag for bool {
    fn is_boss(&self) -> bool {
        *self
    }
}

/// Read access to quest/wave configuration.
pub trait QuestOracle: Send + Sync {
    /// Number of waves in `quest`, or `None` when the quest does not exist.
    fn wave_count(&self, quest: u32) -> Option<u32>;

    /// Wave record for a 1-based `wave` index.
    fn wave(&self, quest: u32, wave: u32) -> Option<&dyn HasBossFlag>;

    /// Boss flag for a 1-based wave index.
    fn is_boss_wave(&self, quest: u32, wave: u32) -> Option<bool> {
        self.wave(quest, wave).map(HasBossFlag::is_boss)
    }
}

/// Quest oracle built from plain boss flags, one `Vec` per quest.
///
/// Useful for tests and scripted encounters.
#[derive(Clone, Debug, Default)]
pub struct StaticQuests {
    quests: Vec<Vec<bool>>,
}

impl StaticQuests {
    pub fn new(quests: Vec<Vec<bool>>) -> Self {
        Self { quests }
    }
}

impl QuestOracle for StaticQuests {
    fn wave_count(&self, quest: u32) -> Option<u32> {
        self.quests.get(quest as usize).map(|w| w.len() as u32)
    }

    fn wave(&self, quest: u32, wave: u32) -> Option<&dyn HasBossFlag> {
        let waves = self.quests.get(quest as usize)?;
        let index = wave.checked_sub(1)? as usize;
        waves.get(index).map(|flag| flag as &dyn HasBossFlag)
    }
}
