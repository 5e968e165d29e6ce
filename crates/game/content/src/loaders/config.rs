//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat tuning from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to [`CombatConfig::default`].
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
