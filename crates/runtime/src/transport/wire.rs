//! Messages exchanged between the host hub and its peers.

use serde::{Deserialize, Serialize};

use combat_core::GameCommand;

use super::FrameError;
use crate::admission::ConnectionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireMessage {
    /// First message of a joining peer; the payload is a JSON
    /// `ConnectionRequest`.
    Hello { payload: Vec<u8> },
    Welcome { connection: ConnectionId },
    Denied { reason: String },
    /// Peer → host: please broadcast this command.
    Forward(GameCommand),
    /// Host → peer: apply this command as number `seq`.
    Broadcast { seq: u64, command: GameCommand },
    /// Peer → host: state digest after applying `seq`.
    Digest { seq: u64, digest: [u8; 32] },
}

impl WireMessage {
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::Location;

    #[test]
    fn broadcast_survives_encoding() {
        let msg = WireMessage::Broadcast {
            seq: 7,
            command: GameCommand::MarkTurnEnded(Location::from("FriendlyFront1")),
        };
        let bytes = msg.encode().unwrap();
        assert_eq!(WireMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            WireMessage::decode(&[0xff, 0xff, 0xff, 0xff, 0x01]),
            Err(FrameError::Decode(_))
        ));
    }
}
