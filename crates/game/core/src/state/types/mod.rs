mod board;
mod combatant;
mod common;
mod turn;

pub use board::{Battlefield, BoardLayout, Rank, Roster, Slot};
pub use combatant::{Combatant, Faction, Side, SpecialAbility, StatBlock};
pub use common::{CharacterId, Location, PlayerId};
pub use turn::{RoundOutcome, TurnPhase, TurnState};
