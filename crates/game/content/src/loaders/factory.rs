//! Content factory for building catalogs from data files.

use std::path::{Path, PathBuf};

use combat_core::CombatConfig;

use crate::archetypes::ArchetypeCatalog;
use crate::loaders::{ArchetypeLoader, ConfigLoader, LoadResult, QuestLoader};
use crate::quests::QuestCatalog;

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── quests.ron
/// └── archetypes.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat tuning from `config.toml`, or defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the quest catalog from `quests.ron`.
    pub fn load_quests(&self) -> LoadResult<QuestCatalog> {
        QuestLoader::load(&self.data_dir.join("quests.ron"))
    }

    /// Load the archetype catalog from `archetypes.ron`.
    pub fn load_archetypes(&self) -> LoadResult<ArchetypeCatalog> {
        ArchetypeLoader::load(&self.data_dir.join("archetypes.ron"))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use combat_core::QuestOracle;

    use super::*;

    #[test]
    fn loads_from_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quests.ron"),
            r#"[(name: "Q", waves: [(boss: true)])]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("archetypes.ron"), "[]").unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.data_dir(), dir.path());
        assert_eq!(factory.load_config().unwrap(), CombatConfig::default());
        assert_eq!(factory.load_quests().unwrap().is_boss_wave(0, 1), Some(true));
        assert!(factory.load_archetypes().unwrap().is_empty());
    }

    #[test]
    fn missing_quest_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_quests().unwrap_err();
        assert!(err.to_string().contains("quests.ron"));
    }
}
