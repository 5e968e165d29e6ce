//! Archetype catalog loader.

use std::path::Path;

use combat_core::{ArchetypeDefinition, ArchetypeOracle};

use crate::archetypes::ArchetypeCatalog;
use crate::loaders::{LoadResult, read_file};

/// Loader for archetype definitions from RON files.
pub struct ArchetypeLoader;

impl ArchetypeLoader {
    /// Load archetypes from a RON file.
    ///
    /// RON format: `Vec<ArchetypeDefinition>`. Duplicate kinds are an error.
    pub fn load(path: &Path) -> LoadResult<ArchetypeCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<ArchetypeCatalog> {
        let definitions: Vec<ArchetypeDefinition> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse archetype RON: {}", e))?;

        let mut catalog = ArchetypeCatalog::default();
        for definition in definitions {
            if definition.base.min_damage > definition.base.max_damage {
                anyhow::bail!(
                    "Archetype '{}' has min_damage above max_damage",
                    definition.kind
                );
            }
            if catalog.archetype(&definition.kind).is_some() {
                anyhow::bail!("Duplicate archetype '{}'", definition.kind);
            }
            catalog.insert(definition);
        }
        Ok(catalog)
    }
}
