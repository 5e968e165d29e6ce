//! Relay links between participants.
//!
//! A [`Link`] is a bidirectional stream of [`WireMessage`]s. In-process
//! sessions use [`memory_pair`]; networked sessions bridge a TCP stream into
//! the same shape with [`tcp::spawn_link`].

mod framing;
pub mod tcp;
mod wire;

pub use framing::{MAX_FRAME_SIZE, read_frame, write_frame};
pub use wire::WireMessage;

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: u32 },

    #[error("malformed wire message")]
    Decode(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One end of a relay connection.
#[derive(Debug)]
pub struct Link {
    pub tx: mpsc::Sender<WireMessage>,
    pub rx: mpsc::Receiver<WireMessage>,
}

/// Two connected in-process link ends.
pub fn memory_pair(buffer: usize) -> (Link, Link) {
    let (a_tx, b_rx) = mpsc::channel(buffer);
    let (b_tx, a_rx) = mpsc::channel(buffer);
    (
        Link { tx: a_tx, rx: a_rx },
        Link { tx: b_tx, rx: b_rx },
    )
}
