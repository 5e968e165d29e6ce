//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, relay links and admission so
//! clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use combat_core::CombatError;

use crate::transport::FrameError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("participant worker command channel closed")]
    CommandChannelClosed,

    #[error("participant worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("participant worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("relay target unavailable; command dropped")]
    RelayClosed,

    #[error("session admission denied: {reason}")]
    AdmissionDenied { reason: String },

    #[error("host closed the link during admission")]
    HandshakeAborted,

    #[error("operation requires session host authority")]
    NotHost,

    #[error("archetype '{0}' is not configured")]
    UnknownArchetype(String),

    #[error("no combatant spawned at '{0}'")]
    SpawnNotObserved(String),

    #[error("{0} not configured")]
    MissingService(&'static str),

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("connection payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
