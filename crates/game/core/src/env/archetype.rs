//! Archetype definitions and the stat-generation seam.
//!
//! Archetypes are the read-only input of stat generation: base numbers, an
//! action list, a special-ability tag and an upgrade-focus weighting. Turning an archetype plus an
//! upgrade budget into a final [`StatBlock`] is the job of a
//! [`StatGenerator`], which lives outside the rules engine.

use crate::action::CharacterSetupPayload;
use crate::state::{CharacterId, Location, StatBlock};

/// Read-only definition of a combatant archetype.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchetypeDefinition {
    pub kind: String,
    pub display_name: String,
    pub base: StatBlock,
    pub action_ids: Vec<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub special: String,
    /// Relative weights for spending upgrade points: (health, defence, damage).
    #[cfg_attr(feature = "serde", serde(default))]
    pub upgrade_focus: (u8, u8, u8),
}

/// Looks up archetypes by kind.
pub trait ArchetypeOracle: Send + Sync {
    fn archetype(&self, kind: &str) -> Option<&ArchetypeDefinition>;
}

/// Produces the final stat block of a spawned combatant.
pub trait StatGenerator: Send + Sync {
    fn generate(&self, definition: &ArchetypeDefinition, upgrade_points: u32) -> StatBlock;

    /// Builds the payload applied through `SetCharacterStats`.
    fn setup_payload(
        &self,
        id: CharacterId,
        location: Location,
        definition: &ArchetypeDefinition,
        upgrade_points: u32,
    ) -> CharacterSetupPayload {
        CharacterSetupPayload {
            id,
            name: definition.display_name.clone(),
            location,
            stats: self.generate(definition, upgrade_points),
            special: definition.special.clone(),
            action_ids: definition.action_ids.clone(),
        }
    }
}

/// Generator that returns the archetype's base stats unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseStats;

impl StatGenerator for BaseStats {
    fn generate(&self, definition: &ArchetypeDefinition, _upgrade_points: u32) -> StatBlock {
        definition.base.clone()
    }
}
