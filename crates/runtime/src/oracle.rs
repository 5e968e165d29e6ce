//! Shared handles to static combat content.
//!
//! [`OracleManager`] bundles the content catalogs so every worker can build a
//! [`CombatEnv`] snapshot on demand. The data is immutable at runtime; dynamic
//! state lives in [`combat_core::CombatState`].
use std::sync::Arc;

use combat_content::{ArchetypeCatalog, QuestCatalog, SpawnSpec};
use combat_core::{ArchetypeDefinition, ArchetypeOracle, BaseStats, CombatEnv, StatGenerator};

#[derive(Clone)]
pub struct OracleManager {
    pub(crate) quests: Arc<QuestCatalog>,
    pub(crate) archetypes: Arc<ArchetypeCatalog>,
    pub(crate) stats: Arc<dyn StatGenerator>,
}

impl OracleManager {
    pub fn new(quests: Arc<QuestCatalog>, archetypes: Arc<ArchetypeCatalog>) -> Self {
        Self {
            quests,
            archetypes,
            stats: Arc::new(BaseStats),
        }
    }

    /// Replaces the stat generator used for spawned combatants.
    pub fn with_stat_generator(mut self, stats: Arc<dyn StatGenerator>) -> Self {
        self.stats = stats;
        self
    }

    pub fn as_combat_env(&self) -> CombatEnv<'_> {
        CombatEnv::new(Some(self.quests.as_ref()), Some(self.archetypes.as_ref()))
    }

    pub fn archetype(&self, kind: &str) -> Option<&ArchetypeDefinition> {
        self.archetypes.archetype(kind)
    }

    pub fn stat_generator(&self) -> &dyn StatGenerator {
        self.stats.as_ref()
    }

    /// Spawn list of `wave` (1-based) in `quest`.
    pub fn wave_spawns(&self, quest: u32, wave: u32) -> Option<&[SpawnSpec]> {
        self.quests
            .wave_definition(quest, wave)
            .map(|w| w.spawns.as_slice())
    }
}

impl Default for OracleManager {
    fn default() -> Self {
        Self::new(
            Arc::new(QuestCatalog::new(Vec::new())),
            Arc::new(ArchetypeCatalog::new(Vec::new())),
        )
    }
}
