//! Cloneable façade over one participant's worker.
//!
//! [`ParticipantHandle`] hides channel plumbing and offers async helpers for
//! reading state and streaming events from specific topics. It never mutates
//! state: mutations go through a `CommandDispatcher`.
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use combat_core::CombatState;

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Read side of a participant: state queries, progress and events.
#[derive(Clone)]
pub struct ParticipantHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    applied_rx: watch::Receiver<u64>,
}

impl ParticipantHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        applied_rx: watch::Receiver<u64>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            applied_rx,
        }
    }

    /// Snapshot of the participant's combat state.
    pub async fn query_state(&self) -> Result<CombatState> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// SHA-256 digest of the current combat state.
    pub async fn digest(&self) -> Result<[u8; 32]> {
        self.request(|reply| Command::QueryDigest { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Sequence number of the last relayed command applied locally
    pub fn applied_seq(&self) -> u64 {
        *self.applied_rx.borrow()
    }

    /// Wait until the command numbered `seq` has been applied
    pub async fn wait_for_seq(&self, seq: u64) -> Result<()> {
        let mut rx = self.applied_rx.clone();
        rx.wait_for(|applied| *applied >= seq)
            .await
            .map(|_| ())
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Receiver for one topic; see [`Topic`] for what each carries.
    ///
    /// ```rust,ignore
    /// let mut combat_rx = handle.subscribe(Topic::Combat);
    /// while let Ok(event) = combat_rx.recv().await {
    ///     // animate hits
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub(crate) fn command_sender(&self) -> &mpsc::Sender<Command> {
        &self.command_tx
    }
}
