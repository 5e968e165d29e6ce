//! Attack commands, targeting and relay operations.
//!
//! - `attack`: the per-attack payload and its effect vocabulary
//! - `targeting`: target-plan computation from board occupancy
//! - `command`: [`GameCommand`], the unit the relay carries
//! - `setup`: one-shot character initialization payload

mod attack;
mod command;
mod setup;
mod targeting;

pub use attack::{AttackCommand, EffectKind, Issuer};
pub use command::GameCommand;
pub use setup::CharacterSetupPayload;
pub use targeting::{TargetPlan, TargetingMode, plan_targets};
