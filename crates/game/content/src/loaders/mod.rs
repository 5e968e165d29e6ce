//! Content loaders for reading combat data from files.
//!
//! Loaders convert RON/TOML files into the catalogs and configuration the
//! core consumes through its oracle traits.

pub mod archetypes;
pub mod config;
pub mod factory;
pub mod quests;

pub use archetypes::ArchetypeLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use quests::QuestLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
