//! Traits describing read-only configuration data.
//!
//! Oracles expose quest/wave configuration, archetype definitions and
//! randomness. The [`CombatEnv`] aggregate bundles the configuration oracles
//! so the engine can access everything it needs without hard coupling to
//! concrete implementations.
mod archetype;
mod error;
mod quest;
mod rng;

pub use archetype::{ArchetypeDefinition, ArchetypeOracle, BaseStats, StatGenerator};
pub use error::OracleError;
pub use quest::{HasBossFlag, QuestOracle, StaticQuests};
pub use rng::{DiceRoller, PcgRng, RngOracle, compute_seed, roll_context};

/// Aggregates read-only oracles required by the engine.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    quests: Option<&'a dyn QuestOracle>,
    archetypes: Option<&'a dyn ArchetypeOracle>,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        quests: Option<&'a dyn QuestOracle>,
        archetypes: Option<&'a dyn ArchetypeOracle>,
    ) -> Self {
        Self { quests, archetypes }
    }

    pub fn with_quests(quests: &'a dyn QuestOracle) -> Self {
        Self::new(Some(quests), None)
    }

    pub fn empty() -> Self {
        Self::new(None, None)
    }

    /// Returns the QuestOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::QuestsNotAvailable` if no quest oracle was provided.
    pub fn quests(&self) -> Result<&'a dyn QuestOracle, OracleError> {
        self.quests.ok_or(OracleError::QuestsNotAvailable)
    }

    /// Returns the ArchetypeOracle, or an error if not available.
    pub fn archetypes(&self) -> Result<&'a dyn ArchetypeOracle, OracleError> {
        self.archetypes.ok_or(OracleError::ArchetypesNotAvailable)
    }

    /// Boss flag of `wave` in `quest`.
    ///
    /// # Errors
    ///
    /// Fails when quests are unavailable, no quest is selected, or the wave
    /// index is out of range.
    pub fn boss_flag(&self, quest: Option<u32>, wave: u32) -> Result<bool, OracleError> {
        let quest = quest.ok_or(OracleError::NoQuestSelected)?;
        let quests = self.quests()?;
        if quests.wave_count(quest).is_none() {
            return Err(OracleError::QuestNotFound(quest));
        }
        quests
            .is_boss_wave(quest, wave)
            .ok_or(OracleError::WaveNotFound { quest, wave })
    }
}

impl std::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("quests", &self.quests.is_some())
            .field("archetypes", &self.archetypes.is_some())
            .finish()
    }
}
