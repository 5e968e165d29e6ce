//! Quest catalog loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::quests::{QuestCatalog, QuestDefinition};

/// Loader for quest definitions from RON files.
pub struct QuestLoader;

impl QuestLoader {
    /// Load a quest catalog from a RON file.
    ///
    /// RON format: `Vec<QuestDefinition>`; quest indices follow file order.
    pub fn load(path: &Path) -> LoadResult<QuestCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<QuestCatalog> {
        let quests: Vec<QuestDefinition> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse quest RON: {}", e))?;

        for (index, quest) in quests.iter().enumerate() {
            if quest.waves.is_empty() {
                anyhow::bail!("Quest {} ('{}') has no waves", index, quest.name);
            }
        }
        Ok(QuestCatalog::new(quests))
    }
}
