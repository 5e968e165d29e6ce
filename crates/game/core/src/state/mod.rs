//! Authoritative combat state representation.
//!
//! This module owns the board, combatant records, roster and turn counters.
//! Runtime layers clone or query this state but mutate it exclusively through
//! [`crate::engine::CombatEngine`].
pub mod types;

pub use types::{
    Battlefield, BoardLayout, CharacterId, Combatant, Faction, Location, PlayerId, Rank,
    RoundOutcome, Roster, Side, Slot, SpecialAbility, StatBlock, TurnPhase, TurnState,
};

/// Canonical snapshot of one participant's combat state.
///
/// Every participant must reach an identical `CombatState` after each command
/// is applied; [`CombatState::digest`] is what peers compare.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    pub battlefield: Battlefield,
    pub turn: TurnState,
}

impl CombatState {
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            battlefield: Battlefield::new(layout),
            turn: TurnState::new(),
        }
    }

    /// An encounter is running and one side has nobody left standing.
    pub fn round_over(&self) -> bool {
        let roster = &self.battlefield.roster;
        self.turn.in_combat
            && !self.turn.game_ended
            && !(roster.has_hostiles() && roster.has_friendlies())
    }

    /// SHA-256 over the bincode encoding of the whole state.
    ///
    /// Requires the `serde` feature. Bincode output is deterministic for the
    /// ordered collections used here, so equal states hash equally.
    #[cfg(feature = "serde")]
    pub fn digest(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        if let Ok(bytes) = bincode::serialize(self) {
            hasher.update(&bytes);
        }
        hasher.finalize().into()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn digest_tracks_state_changes() {
        let a = CombatState::default();
        let mut b = CombatState::default();
        assert_eq!(hex::encode(a.digest()), hex::encode(b.digest()));

        b.turn.turn += 1;
        assert_ne!(a.digest(), b.digest());
    }
}
