//! Command relay.
//!
//! Every state change travels as a [`GameCommand`] through a
//! [`CommandDispatcher`]. A solo participant applies it directly; in a
//! session the host's [`hub::RelayHub`] numbers it and broadcasts it to every
//! participant, itself included, so all workers apply the same sequence.

pub(crate) mod hub;
pub(crate) mod peer;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::error;

use combat_core::GameCommand;

use crate::api::{Result, RuntimeError};
use crate::transport::WireMessage;
use crate::workers::Command;
use hub::HubInput;

/// A relayed command stamped with its broadcast sequence number.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub seq: u64,
    pub command: GameCommand,
}

/// State digest of one participant after applying `seq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigestReport {
    pub seq: u64,
    pub digest: [u8; 32],
}

/// Routes commands to every participant that must apply them.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    /// Sends `command` on its way. Failures are logged and the command is
    /// dropped; nothing is retried.
    async fn dispatch(&self, command: GameCommand) -> Result<()>;

    /// Resolves once everything this participant dispatched so far has
    /// reached its local worker and been applied.
    async fn flush(&self) -> Result<()>;

    fn is_networked(&self) -> bool;
}

async fn barrier(worker: &mpsc::Sender<Command>) -> Result<()> {
    let (reply, done) = oneshot::channel();
    worker
        .send(Command::Barrier { reply })
        .await
        .map_err(|_| RuntimeError::CommandChannelClosed)?;
    done.await.map_err(RuntimeError::ReplyChannelClosed)
}

/// Applies commands on the local worker only.
pub struct LocalDispatcher {
    next_seq: Mutex<u64>,
    worker: mpsc::Sender<Command>,
}

impl LocalDispatcher {
    pub(crate) fn new(worker: mpsc::Sender<Command>) -> Self {
        Self {
            next_seq: Mutex::new(0),
            worker,
        }
    }
}

#[async_trait]
impl CommandDispatcher for LocalDispatcher {
    async fn dispatch(&self, command: GameCommand) -> Result<()> {
        let name = command.name();
        let mut seq = self.next_seq.lock().await;
        *seq += 1;
        let envelope = Envelope { seq: *seq, command };
        self.worker
            .send(Command::Apply(envelope))
            .await
            .map_err(|_| {
                error!(command = name, "local worker closed; command dropped");
                RuntimeError::RelayClosed
            })
    }

    async fn flush(&self) -> Result<()> {
        barrier(&self.worker).await
    }

    fn is_networked(&self) -> bool {
        false
    }
}

/// Sends commands through the session relay.
pub enum NetworkDispatcher {
    /// The host hands commands to its own hub.
    Host { hub: mpsc::Sender<HubInput> },
    /// Peers forward commands to the host over their link.
    Peer {
        link: mpsc::Sender<WireMessage>,
        worker: mpsc::Sender<Command>,
    },
}

#[async_trait]
impl CommandDispatcher for NetworkDispatcher {
    async fn dispatch(&self, command: GameCommand) -> Result<()> {
        let name = command.name();
        let sent = match self {
            NetworkDispatcher::Host { hub } => hub.send(HubInput::Originate(command)).await.is_ok(),
            NetworkDispatcher::Peer { link, .. } => {
                link.send(WireMessage::Forward(command)).await.is_ok()
            }
        };
        if sent {
            Ok(())
        } else {
            error!(command = name, "relay closed; command dropped");
            Err(RuntimeError::RelayClosed)
        }
    }

    async fn flush(&self) -> Result<()> {
        match self {
            NetworkDispatcher::Host { hub } => {
                let (reply, done) = oneshot::channel();
                hub.send(HubInput::Flush(reply))
                    .await
                    .map_err(|_| RuntimeError::RelayClosed)?;
                done.await.map_err(RuntimeError::ReplyChannelClosed)
            }
            // A peer cannot observe the host's queue; settle for its own.
            NetworkDispatcher::Peer { worker, .. } => barrier(worker).await,
        }
    }

    fn is_networked(&self) -> bool {
        true
    }
}
