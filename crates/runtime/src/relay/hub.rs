//! Host-side relay hub.
//!
//! The hub is a single task that owns session membership, assigns broadcast
//! sequence numbers and fans every command out to the host's own worker and
//! all admitted peers. It also collects per-sequence state digests and
//! reports divergence.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use combat_core::GameCommand;

use super::{DigestReport, Envelope};
use crate::admission::{AdmissionDecision, AdmissionGate, ConnectionId};
use crate::events::{EventBus, SessionEvent};
use crate::transport::{Link, WireMessage};
use crate::workers::Command;

/// Digest rounds kept while waiting for slow reporters.
const MAX_PENDING_DIGESTS: usize = 1024;

pub enum HubInput {
    /// A command originated on the host.
    Originate(GameCommand),
    /// Replies once everything queued before it reached the host worker.
    Flush(oneshot::Sender<()>),
    /// A new connection awaiting its `Hello`.
    Connect(Link),
    Handshake {
        link: Link,
        payload: Option<Vec<u8>>,
    },
    FromPeer {
        connection: ConnectionId,
        message: WireMessage,
    },
    Disconnected(ConnectionId),
    Shutdown,
}

pub struct RelayHub {
    gate: AdmissionGate,
    seq: u64,
    worker: mpsc::Sender<Command>,
    peers: BTreeMap<ConnectionId, mpsc::Sender<WireMessage>>,
    digests: BTreeMap<u64, BTreeMap<ConnectionId, [u8; 32]>>,
    inbox_rx: mpsc::Receiver<HubInput>,
    inbox_tx: mpsc::WeakSender<HubInput>,
    digest_rx: mpsc::Receiver<DigestReport>,
    event_bus: EventBus,
}

impl RelayHub {
    pub fn new(
        gate: AdmissionGate,
        worker: mpsc::Sender<Command>,
        inbox_tx: &mpsc::Sender<HubInput>,
        inbox_rx: mpsc::Receiver<HubInput>,
        digest_rx: mpsc::Receiver<DigestReport>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            gate,
            seq: 0,
            worker,
            peers: BTreeMap::new(),
            digests: BTreeMap::new(),
            inbox_rx,
            inbox_tx: inbox_tx.downgrade(),
            digest_rx,
            event_bus,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(input) = self.inbox_rx.recv() => {
                    if !self.handle_input(input).await {
                        break;
                    }
                }
                Some(report) = self.digest_rx.recv() => {
                    self.record_digest(ConnectionId::HOST, report.seq, report.digest);
                }
                else => break,
            }
        }
        info!(peers = self.peers.len(), "relay hub stopped");
    }

    async fn handle_input(&mut self, input: HubInput) -> bool {
        match input {
            HubInput::Originate(command) => self.broadcast(command).await,
            HubInput::Flush(reply) => {
                if self.worker.send(Command::Barrier { reply }).await.is_err() {
                    warn!("flush requested after the host worker stopped");
                }
            }
            HubInput::Connect(link) => self.await_hello(link),
            HubInput::Handshake { link, payload } => self.admit(link, payload).await,
            HubInput::FromPeer {
                connection,
                message,
            } => self.handle_peer_message(connection, message).await,
            HubInput::Disconnected(connection) => self.disconnect(connection),
            HubInput::Shutdown => return false,
        }
        true
    }

    async fn broadcast(&mut self, command: GameCommand) {
        self.seq += 1;
        let seq = self.seq;
        debug!(seq, command = command.name(), "broadcasting");

        for (connection, tx) in &self.peers {
            let message = WireMessage::Broadcast {
                seq,
                command: command.clone(),
            };
            if tx.send(message).await.is_err() {
                warn!(%connection, seq, "peer link closed; broadcast not delivered");
            }
        }

        let envelope = Envelope { seq, command };
        if self.worker.send(Command::Apply(envelope)).await.is_err() {
            error!(seq, "host worker closed; broadcast not applied locally");
        }
    }

    /// Waits for the connection's first message off the hub task.
    fn await_hello(&self, mut link: Link) {
        let Some(inbox) = self.inbox_tx.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let payload = match link.rx.recv().await {
                Some(WireMessage::Hello { payload }) => Some(payload),
                Some(other) => {
                    debug!(?other, "first message was not a hello");
                    None
                }
                None => return,
            };
            let _ = inbox.send(HubInput::Handshake { link, payload }).await;
        });
    }

    async fn admit(&mut self, link: Link, payload: Option<Vec<u8>>) {
        let Link { tx, rx } = link;
        match self.gate.admit(payload.as_deref()) {
            AdmissionDecision::Approved { connection } => {
                if tx.send(WireMessage::Welcome { connection }).await.is_err() {
                    self.gate.disconnect(connection);
                    return;
                }
                if let Some(player) = self.gate.player(connection).cloned() {
                    let display_name = self
                        .gate
                        .display_name(connection)
                        .unwrap_or(player.as_str())
                        .to_string();
                    debug!(%connection, members = self.gate.member_count(), "roster grew");
                    self.event_bus.publish(SessionEvent::PlayerJoined {
                        connection,
                        player,
                        display_name,
                    });
                }
                self.peers.insert(connection, tx);
                self.spawn_reader(connection, rx);
            }
            AdmissionDecision::Denied { reason } => {
                let _ = tx
                    .send(WireMessage::Denied {
                        reason: reason.clone(),
                    })
                    .await;
                self.event_bus
                    .publish(SessionEvent::AdmissionDenied { reason });
            }
        }
    }

    fn spawn_reader(&self, connection: ConnectionId, mut rx: mpsc::Receiver<WireMessage>) {
        let Some(inbox) = self.inbox_tx.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let input = HubInput::FromPeer {
                    connection,
                    message,
                };
                if inbox.send(input).await.is_err() {
                    return;
                }
            }
            let _ = inbox.send(HubInput::Disconnected(connection)).await;
        });
    }

    async fn handle_peer_message(&mut self, connection: ConnectionId, message: WireMessage) {
        match message {
            WireMessage::Forward(command) => self.broadcast(command).await,
            WireMessage::Digest { seq, digest } => self.record_digest(connection, seq, digest),
            other => warn!(%connection, ?other, "unexpected message from peer"),
        }
    }

    fn disconnect(&mut self, connection: ConnectionId) {
        self.peers.remove(&connection);
        for reports in self.digests.values_mut() {
            reports.remove(&connection);
        }
        if let Some(player) = self.gate.disconnect(connection) {
            info!(%connection, player = player.as_str(), "player left");
            self.event_bus
                .publish(SessionEvent::PlayerLeft { connection, player });
        }
    }

    /// Compares digests once every participant has reported `seq`.
    fn record_digest(&mut self, from: ConnectionId, seq: u64, digest: [u8; 32]) {
        let expected = self.peers.len() + 1;
        let reports = self.digests.entry(seq).or_default();
        reports.insert(from, digest);
        if reports.len() < expected {
            if self.digests.len() > MAX_PENDING_DIGESTS {
                self.digests.pop_first();
            }
            return;
        }

        let mut values = reports.values();
        let first = values.next().copied();
        if values.any(|d| Some(*d) != first) {
            error!(seq, "state digests diverged");
            for (connection, digest) in reports.iter() {
                debug!(%connection, digest = %hex::encode(digest), "digest");
            }
            self.event_bus.publish(SessionEvent::DesyncDetected { seq });
        }

        // Older rounds can no longer complete.
        self.digests = self.digests.split_off(&(seq + 1));
    }
}
