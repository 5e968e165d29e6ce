//! Runtime orchestration for synchronized turn-based combat.
//!
//! This crate wires the deterministic rules in `combat-core` into async
//! participants that stay in lock-step over a command relay. Consumers embed a
//! [`Participant`] to dispatch commands, resolve attacks and subscribe to
//! events through a [`ParticipantHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the participant and its builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`relay`] and [`transport`] carry commands between participants
//! - [`admission`] gates who may join a hosted session
//! - [`resolver`] paces attack sequences and supports pre-emption
//! - [`workers`] keeps background tasks internal to the crate
pub mod admission;
pub mod api;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod events;
pub mod oracle;
pub mod relay;
pub mod resolver;
pub mod runtime;
pub mod transport;

mod workers;

pub use admission::{
    AdmissionDecision, AdmissionGate, ConnectionId, ConnectionRequest, PROTOCOL_VERSION,
};
pub use api::{
    ActionProvider, BasicAttackProvider, ChannelSelector, FirstCandidateSelector,
    ParticipantHandle, Result, RuntimeError, TargetSelector,
};
pub use cancel::CancelToken;
pub use clock::{Clock, TokioClock};
pub use config::{RuntimeConfig, SequenceTiming};
pub use events::{CombatEvent, Event, EventBus, SessionEvent, Topic, TurnEvent};
pub use oracle::OracleManager;
pub use relay::{CommandDispatcher, DigestReport, Envelope, LocalDispatcher, NetworkDispatcher};
pub use resolver::{AttackResolver, SequenceOutcome};
pub use runtime::{Participant, ParticipantBuilder, Role};
pub use transport::{FrameError, Link, WireMessage, memory_pair};
