//! TCP bridge for relay links.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Link, WireMessage, read_frame, write_frame};

/// Bridges `stream` into a [`Link`].
///
/// A reader and a writer task are spawned; either side closing the link ends
/// both tasks.
pub fn spawn_link(stream: TcpStream, buffer: usize) -> Link {
    let peer = stream.peer_addr().ok();
    let (mut reader, mut writer) = stream.into_split();
    let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<WireMessage>(buffer);

    tokio::spawn(async move {
        loop {
            let frame = match read_frame(&mut reader).await {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(?peer, "link reader stopped: {}", e);
                    break;
                }
            };
            match WireMessage::decode(&frame) {
                Ok(msg) => {
                    if inbound_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(?peer, "dropping undecodable frame: {}", e);
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let result = match msg.encode() {
                Ok(bytes) => write_frame(&mut writer, &bytes).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(?peer, "link writer stopped: {}", e);
                break;
            }
        }
    });

    Link {
        tx: outbound_tx,
        rx: inbound_rx,
    }
}

pub async fn connect(addr: impl ToSocketAddrs, buffer: usize) -> std::io::Result<Link> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(spawn_link(stream, buffer))
}

/// Accepts connections and forwards each bridged link to `links`.
///
/// Returns when `links` is closed or the listener fails.
pub async fn accept_loop(listener: TcpListener, links: mpsc::Sender<Link>, buffer: usize) {
    let local: Option<SocketAddr> = listener.local_addr().ok();
    info!(?local, "accepting relay connections");
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "relay connection accepted");
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(%addr, "failed to set TCP_NODELAY: {}", e);
                }
                if links.send(spawn_link(stream, buffer)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("relay listener failed: {}", e);
                break;
            }
        }
    }
}
