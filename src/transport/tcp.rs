//! TCP socket handling and frame I/O.
//!
//! Connections are plain `tokio::net::TcpStream`s. Frame I/O is generic over
//! `AsyncRead` / `AsyncWrite` so it can be exercised over in-memory streams.
//!
//! # Example
//!
//! ```ignore
//! use evoke_rpc::protocol::FrameBuffer;
//! use evoke_rpc::transport::{connect, read_frame, write_frame};
//!
//! let mut stream = connect("localhost", 7889).await?;
//! write_frame(&mut stream, &frame_bytes).await?;
//! let frame = read_frame(&mut stream, &mut FrameBuffer::new()).await?;
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Result, RpcError};
use crate::protocol::{Frame, FrameBuffer};

/// Read buffer size for a single socket read (64KB).
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Bind a listener on `host:port`.
///
/// A bind failure is fatal for the server and is returned as-is.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    Ok(listener)
}

/// Open a new connection to `host:port`.
///
/// # Errors
///
/// Returns [`RpcError::Connect`] if the host cannot be resolved or no
/// connection can be established.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| RpcError::Connect {
            addr: format!("{host}:{port}"),
            source,
        })?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Read from `reader` until one complete frame is available.
///
/// Returns `Ok(None)` if the peer closes the stream before a full frame
/// arrived. A connection carries a single exchange, so any frames or bytes
/// following the first delimiter are discarded.
///
/// # Errors
///
/// Propagates I/O errors and [`RpcError::FrameTooLarge`].
pub async fn read_frame<R>(reader: &mut R, frame_buffer: &mut FrameBuffer) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            if !frame_buffer.is_empty() {
                tracing::debug!(
                    buffered = frame_buffer.len(),
                    "stream closed with an incomplete frame"
                );
            }
            return Ok(None);
        }

        let mut frames = frame_buffer.push(&buf[..n])?.into_iter();

        if let Some(frame) = frames.next() {
            let extra_frames = frames.count();
            if extra_frames > 0 || !frame_buffer.is_empty() {
                tracing::warn!(
                    extra_frames,
                    trailing_bytes = frame_buffer.len(),
                    "discarding data after the first frame"
                );
                frame_buffer.clear();
            }
            return Ok(Some(frame));
        }
    }
}

/// Write a complete, already delimited frame and flush.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and discard until the peer closes the stream.
///
/// Returns the number of bytes discarded.
pub async fn drain<R>(reader: &mut R) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut discarded = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(discarded);
        }
        discarded += n;
    }
}
