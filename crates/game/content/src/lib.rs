//! Data-driven combat content and loaders.
//!
//! This crate houses the static data an encounter is built from and provides
//! loaders for RON/TOML data files:
//! - Quests and their waves (data-driven via RON)
//! - Combatant archetypes (data-driven via RON)
//! - Combat tuning (data-driven via TOML)
//!
//! Content is consumed through the core's oracle traits and never appears in
//! combat state.

pub mod archetypes;
pub mod quests;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use archetypes::ArchetypeCatalog;
pub use quests::{QuestCatalog, QuestDefinition, SpawnSpec, WaveDefinition};

#[cfg(feature = "loaders")]
pub use loaders::{ArchetypeLoader, ConfigLoader, ContentFactory, QuestLoader};
