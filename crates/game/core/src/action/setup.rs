//! One-shot character initialization payload.

use crate::state::{CharacterId, Location, StatBlock};

/// Final numeric profile of a freshly spawned combatant.
///
/// Applied once through `SetCharacterStats` and not retained afterwards. The
/// special-ability tag travels as text and is parsed on application.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterSetupPayload {
    pub id: CharacterId,
    pub name: String,
    pub location: Location,
    pub stats: StatBlock,
    pub special: String,
    pub action_ids: Vec<u32>,
}
