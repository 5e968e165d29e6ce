//! Peer side of a session link.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{DigestReport, Envelope};
use crate::admission::{ConnectionId, ConnectionRequest};
use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, SessionEvent};
use crate::transport::{Link, WireMessage};
use crate::workers::Command;

/// Sends the join request and waits for the host's verdict.
pub async fn join(link: &mut Link, request: &ConnectionRequest) -> Result<ConnectionId> {
    let payload = request.to_payload()?;
    link.tx
        .send(WireMessage::Hello { payload })
        .await
        .map_err(|_| RuntimeError::HandshakeAborted)?;

    match link.rx.recv().await {
        Some(WireMessage::Welcome { connection }) => {
            info!(%connection, player = request.player_id.as_str(), "admitted to session");
            Ok(connection)
        }
        Some(WireMessage::Denied { reason }) => {
            warn!(reason = reason.as_str(), "admission denied");
            Err(RuntimeError::AdmissionDenied { reason })
        }
        Some(other) => {
            warn!(?other, "unexpected handshake reply");
            Err(RuntimeError::HandshakeAborted)
        }
        None => Err(RuntimeError::HandshakeAborted),
    }
}

/// Feeds host broadcasts into the local worker and reports digests back.
pub struct PeerLink {
    connection: ConnectionId,
    rx: mpsc::Receiver<WireMessage>,
    tx: mpsc::Sender<WireMessage>,
    worker: mpsc::Sender<Command>,
    digest_rx: mpsc::Receiver<DigestReport>,
    event_bus: EventBus,
}

impl PeerLink {
    pub fn new(
        connection: ConnectionId,
        link: Link,
        worker: mpsc::Sender<Command>,
        digest_rx: mpsc::Receiver<DigestReport>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            connection,
            rx: link.rx,
            tx: link.tx,
            worker,
            digest_rx,
            event_bus,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                message = self.rx.recv() => match message {
                    Some(WireMessage::Broadcast { seq, command }) => {
                        let envelope = Envelope { seq, command };
                        if self.worker.send(Command::Apply(envelope)).await.is_err() {
                            debug!(seq, "worker stopped; closing link");
                            break;
                        }
                    }
                    Some(other) => warn!(?other, "unexpected message from host"),
                    None => {
                        warn!(connection = %self.connection, "link to host closed");
                        self.event_bus.publish(SessionEvent::ConnectionLost);
                        break;
                    }
                },
                Some(report) = self.digest_rx.recv() => {
                    let message = WireMessage::Digest {
                        seq: report.seq,
                        digest: report.digest,
                    };
                    if self.tx.send(message).await.is_err() {
                        debug!(seq = report.seq, "digest not delivered");
                    }
                }
            }
        }
    }
}
