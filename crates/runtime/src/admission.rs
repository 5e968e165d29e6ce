//! Connection admission for hosted sessions.
//!
//! The host runs every join request through an [`AdmissionGate`]. Requests
//! arrive as JSON [`ConnectionRequest`] payloads; the gate owns the session
//! membership and is consulted from the relay hub's single task, so it needs
//! no locking.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use combat_core::PlayerId;

/// Protocol version spoken by this build.
pub const PROTOCOL_VERSION: u32 = 1;

/// Default number of participants, host included.
pub const DEFAULT_CAPACITY: usize = 4;

pub const DENIED_MALFORMED: &str = "Malformed connection payload";
pub const DENIED_MISSING_IDENTITY: &str = "Missing player identity";
pub const DENIED_VERSION_MISMATCH: &str = "Protocol version mismatch";
pub const DENIED_ALREADY_CONNECTED: &str = "Already connected";
pub const DENIED_FULL: &str = "Server is full";

/// Relay-level identifier of one admitted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    /// The host's own connection.
    pub const HOST: ConnectionId = ConnectionId(0);
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Join payload sent by a connecting participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub player_id: String,
    pub display_name: String,
    pub protocol_version: u32,
}

impl ConnectionRequest {
    pub fn new(player_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// JSON body of the `Hello` frame.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    Approved { connection: ConnectionId },
    Denied { reason: String },
}

impl AdmissionDecision {
    fn denied(reason: &str) -> Self {
        AdmissionDecision::Denied {
            reason: reason.to_string(),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, AdmissionDecision::Approved { .. })
    }
}

#[derive(Clone, Debug)]
struct Member {
    player: PlayerId,
    display_name: String,
}

/// Host-side membership and admission rules.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    protocol_version: u32,
    members: BTreeMap<ConnectionId, Member>,
    next_connection: u32,
}

impl AdmissionGate {
    /// Creates a gate whose first member is the host itself.
    pub fn new(host: PlayerId, capacity: usize, protocol_version: u32) -> Self {
        let mut members = BTreeMap::new();
        members.insert(
            ConnectionId::HOST,
            Member {
                display_name: host.as_str().to_string(),
                player: host,
            },
        );
        Self {
            capacity,
            protocol_version,
            members,
            next_connection: 1,
        }
    }

    /// Evaluates a join payload and, on approval, records the member.
    ///
    /// Checks run in order: payload shape, protocol version, identity,
    /// duplicate identity, capacity.
    pub fn admit(&mut self, payload: Option<&[u8]>) -> AdmissionDecision {
        let Some(request) =
            payload.and_then(|bytes| serde_json::from_slice::<ConnectionRequest>(bytes).ok())
        else {
            warn!("admission denied: malformed payload");
            return AdmissionDecision::denied(DENIED_MALFORMED);
        };

        if request.protocol_version != self.protocol_version {
            warn!(
                expected = self.protocol_version,
                got = request.protocol_version,
                "admission denied: protocol mismatch"
            );
            return AdmissionDecision::denied(DENIED_VERSION_MISMATCH);
        }

        let player = PlayerId::new(request.player_id.trim());
        if player.is_empty() {
            warn!("admission denied: missing identity");
            return AdmissionDecision::denied(DENIED_MISSING_IDENTITY);
        }

        if self.is_member(&player) {
            warn!(player = player.as_str(), "admission denied: already connected");
            return AdmissionDecision::denied(DENIED_ALREADY_CONNECTED);
        }

        if self.members.len() >= self.capacity {
            warn!(player = player.as_str(), "admission denied: session full");
            return AdmissionDecision::denied(DENIED_FULL);
        }

        let connection = ConnectionId(self.next_connection);
        self.next_connection += 1;
        info!(
            %connection,
            player = player.as_str(),
            name = request.display_name.as_str(),
            "player admitted"
        );
        self.members.insert(
            connection,
            Member {
                player,
                display_name: request.display_name,
            },
        );
        AdmissionDecision::Approved { connection }
    }

    /// Removes a member; returns its identity if it was present.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<PlayerId> {
        self.members.remove(&connection).map(|m| m.player)
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&PlayerId> {
        self.members.get(&connection).map(|m| &m.player)
    }

    pub fn display_name(&self, connection: ConnectionId) -> Option<&str> {
        self.members.get(&connection).map(|m| m.display_name.as_str())
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.members.values().any(|m| &m.player == player)
    }

    /// Admitted participants, host included.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(capacity: usize) -> AdmissionGate {
        AdmissionGate::new(PlayerId::new("host"), capacity, PROTOCOL_VERSION)
    }

    fn request(player: &str) -> Vec<u8> {
        ConnectionRequest::new(player, player).to_payload().unwrap()
    }

    fn reason(decision: AdmissionDecision) -> String {
        match decision {
            AdmissionDecision::Denied { reason } => reason,
            AdmissionDecision::Approved { connection } => panic!("approved as {connection}"),
        }
    }

    #[test]
    fn host_counts_towards_capacity() {
        let mut gate = gate(2);
        assert!(gate.admit(Some(&request("ana"))).is_approved());
        assert_eq!(reason(gate.admit(Some(&request("bo")))), DENIED_FULL);
        assert_eq!(gate.member_count(), 2);
    }

    #[test]
    fn admitted_member_keeps_its_display_name() {
        let mut gate = gate(4);
        let payload = ConnectionRequest::new("ana", "Ana the Bold").to_payload().unwrap();
        let AdmissionDecision::Approved { connection } = gate.admit(Some(&payload)) else {
            panic!("ana should be admitted");
        };
        assert_eq!(gate.display_name(connection), Some("Ana the Bold"));
        assert_eq!(gate.display_name(ConnectionId::HOST), Some("host"));
        assert_eq!(gate.player(connection), Some(&PlayerId::new("ana")));
    }

    #[test]
    fn payload_is_the_json_request() {
        let payload = ConnectionRequest::new("ana", "Ana").to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["player_id"], "ana");
        assert_eq!(value["display_name"], "Ana");
        assert_eq!(value["protocol_version"], PROTOCOL_VERSION);
    }

    #[test]
    fn duplicate_identity_is_reported_before_capacity() {
        let mut gate = gate(2);
        assert!(gate.admit(Some(&request("ana"))).is_approved());
        assert_eq!(
            reason(gate.admit(Some(&request("ana")))),
            DENIED_ALREADY_CONNECTED
        );
        assert_eq!(
            reason(gate.admit(Some(&request("host")))),
            DENIED_ALREADY_CONNECTED
        );
    }

    #[test]
    fn malformed_and_missing_payloads_are_denied() {
        let mut gate = gate(4);
        assert_eq!(reason(gate.admit(None)), DENIED_MALFORMED);
        assert_eq!(reason(gate.admit(Some(b"not json"))), DENIED_MALFORMED);
        assert_eq!(
            reason(gate.admit(Some(br#"{"player_id":"x"}"#))),
            DENIED_MALFORMED
        );
    }

    #[test]
    fn blank_identity_is_denied() {
        let mut gate = gate(4);
        assert_eq!(
            reason(gate.admit(Some(&request("   ")))),
            DENIED_MISSING_IDENTITY
        );
    }

    #[test]
    fn protocol_mismatch_is_denied() {
        let mut gate = gate(4);
        let mut req = ConnectionRequest::new("ana", "Ana");
        req.protocol_version = PROTOCOL_VERSION + 1;
        assert_eq!(
            reason(gate.admit(Some(&req.to_payload().unwrap()))),
            DENIED_VERSION_MISMATCH
        );
    }

    #[test]
    fn disconnect_frees_the_identity() {
        let mut gate = gate(2);
        let AdmissionDecision::Approved { connection } = gate.admit(Some(&request("ana"))) else {
            panic!("ana should be admitted");
        };
        assert_eq!(gate.disconnect(connection), Some(PlayerId::new("ana")));
        assert!(gate.admit(Some(&request("ana"))).is_approved());
    }
}
