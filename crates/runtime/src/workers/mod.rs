//! Background workers.
//!
//! - [`ParticipantWorker`] owns one participant's combat state
//! - [`HostDirector`] runs host-only effects: fatigue, readiness, AI turns
//!   and the relayed round check
//! - [`TurnForfeiter`] relays the local player's forfeited turns

mod director;
mod forfeit;
mod participant;

pub use director::HostDirector;
pub use forfeit::TurnForfeiter;
pub use participant::{Command, ParticipantWorker};
