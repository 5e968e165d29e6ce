//! Length-delimited framing for relay links.
//!
//! A frame is a 4-byte big-endian length followed by the payload. Payload
//! encoding is the caller's concern (see [`super::WireMessage`]).

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::FrameError;

/// Largest accepted frame payload (1 MiB).
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or(FrameError::TooLarge {
            len: payload.len(),
            max: MAX_FRAME_SIZE,
        })?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame.
///
/// A stream that closes before a full frame arrives yields an
/// `UnexpectedEof` I/O error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge {
            len: len as usize,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}
