//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or the relay.

pub mod errors;
pub mod handle;
pub mod providers;

pub use errors::{Result, RuntimeError};
pub use handle::ParticipantHandle;
pub use providers::{
    ActionProvider, BasicAttackProvider, ChannelSelector, FirstCandidateSelector, TargetSelector,
};
