//! Event bus and typed events.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CombatEvent, SessionEvent, TurnEvent};
