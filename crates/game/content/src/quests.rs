//! Quest and wave definitions.

use combat_core::{HasBossFlag, QuestOracle};

/// One combatant placed at the start of a wave.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SpawnSpec {
    pub location: String,
    pub kind: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ai_ally: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub upgrade_points: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WaveDefinition {
    #[cfg_attr(feature = "serde", serde(default))]
    pub boss: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spawns: Vec<SpawnSpec>,
}

impl HasBossFlag for WaveDefinition {
    fn is_boss(&self) -> bool {
        self.boss
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct QuestDefinition {
    pub name: String,
    pub waves: Vec<WaveDefinition>,
}

/// Quests indexed by position; quest `n` is the `n`th entry.
#[derive(Clone, Debug, Default)]
pub struct QuestCatalog {
    quests: Vec<QuestDefinition>,
}

impl QuestCatalog {
    pub fn new(quests: Vec<QuestDefinition>) -> Self {
        Self { quests }
    }

    pub fn quest(&self, quest: u32) -> Option<&QuestDefinition> {
        self.quests.get(quest as usize)
    }

    /// Wave definition for a 1-based wave index.
    pub fn wave_definition(&self, quest: u32, wave: u32) -> Option<&WaveDefinition> {
        let index = wave.checked_sub(1)? as usize;
        self.quest(quest)?.waves.get(index)
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

impl QuestOracle for QuestCatalog {
    fn wave_count(&self, quest: u32) -> Option<u32> {
        self.quest(quest).map(|q| q.waves.len() as u32)
    }

    fn wave(&self, quest: u32, wave: u32) -> Option<&dyn HasBossFlag> {
        self.wave_definition(quest, wave)
            .map(|w| w as &dyn HasBossFlag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waves_are_one_based() {
        let catalog = QuestCatalog::new(vec![QuestDefinition {
            name: "Road".into(),
            waves: vec![
                WaveDefinition::default(),
                WaveDefinition {
                    boss: true,
                    spawns: Vec::new(),
                },
            ],
        }]);

        assert_eq!(catalog.wave_count(0), Some(2));
        assert_eq!(catalog.is_boss_wave(0, 1), Some(false));
        assert_eq!(catalog.is_boss_wave(0, 2), Some(true));
        assert_eq!(catalog.is_boss_wave(0, 0), None);
        assert_eq!(catalog.is_boss_wave(0, 3), None);
        assert_eq!(catalog.wave_count(1), None);
    }
}
