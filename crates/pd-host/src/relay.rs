//! Half-duplex relay loop
//!
//! Reads one frame, dispatches it, writes one response, and only then reads
//! the next frame. A clean end of input ends the loop; a corrupted frame is
//! returned to the caller, since the stream cannot be resynchronized.

use futures::{SinkExt, StreamExt};
use pd_core::Transport;
use pd_protocol::{NativeCodec, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::dispatch::Dispatcher;

/// Serve requests until the input closes.
///
/// Returns the number of requests answered.
pub async fn serve<R, W, T>(
    reader: R,
    writer: W,
    dispatcher: &Dispatcher<T>,
) -> Result<u64, ProtocolError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    T: Transport,
{
    let mut frames = FramedRead::new(reader, NativeCodec::new());
    let mut responses = FramedWrite::new(writer, NativeCodec::new());
    let mut handled = 0u64;

    while let Some(frame) = frames.next().await {
        let payload = frame?;
        tracing::debug!("Received frame of {} bytes", payload.len());

        let response = dispatcher.dispatch(&payload).await;
        // Flushes after each frame; the caller waits for it before sending more
        responses.send(response).await?;
        handled += 1;
    }

    tracing::info!("Input closed after {} requests", handled);
    Ok(handled)
}
