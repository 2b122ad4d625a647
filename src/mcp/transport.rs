//! Stdio transport: newline-delimited JSON over stdin/stdout.
//!
//! The process lifetime is one implicit session. Inbound lines are
//! dispatched concurrently, but every outbound envelope funnels through a
//! single writer task, so response lines are never interleaved even when
//! handlers finish out of order.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::errors::{AppError, Result};
use crate::mcp::codec::McpCodec;
use crate::mcp::dispatcher::Dispatcher;

/// Outbound channel depth before dispatch tasks are back-pressured.
const OUTBOUND_BUFFER: usize = 64;

/// Serve the dispatcher over stdin/stdout until EOF or cancellation.
///
/// # Errors
///
/// Returns [`AppError::Transport`] if the writer task panics, or
/// [`AppError::Io`] if writing to stdout fails.
pub async fn serve_stdio(dispatcher: Arc<Dispatcher>, cancel: CancellationToken) -> Result<()> {
    serve(dispatcher, tokio::io::stdin(), tokio::io::stdout(), cancel).await
}

/// Serve the dispatcher over arbitrary I/O halves.
///
/// Split out from [`serve_stdio`] so tests can drive the transport over
/// an in-memory duplex stream.
///
/// # Errors
///
/// Returns [`AppError::Transport`] if the writer task panics, or
/// [`AppError::Io`] if writing to `output` fails.
pub async fn serve<R, W>(
    dispatcher: Arc<Dispatcher>,
    input: R,
    output: W,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<serde_json::Value>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(run_writer(output, rx, cancel.clone()));

    let mut framed = FramedRead::new(input, McpCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("stdio transport: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!("stdio transport: EOF on input");
                        break;
                    }
                    Some(Err(AppError::Transport(ref msg))) => {
                        // Framing errors are per-line; skip and keep reading.
                        warn!(error = msg.as_str(), "stdio transport: skipping oversized line");
                    }
                    Some(Err(err)) => {
                        warn!(%err, "stdio transport: read error, stopping");
                        break;
                    }
                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let dispatcher = Arc::clone(&dispatcher);
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let Some(response) = dispatcher.handle_line(&line).await else {
                                return;
                            };
                            match serde_json::to_value(&response) {
                                Ok(value) => {
                                    if tx.send(value).await.is_err() {
                                        debug!("stdio transport: writer gone, dropping response");
                                    }
                                }
                                Err(err) => {
                                    error!(%err, "stdio transport: response serialization failed");
                                }
                            }
                        });
                    }
                }
            }
        }
    }

    // Dropping our sender lets the writer drain in-flight responses and exit.
    drop(tx);
    writer
        .await
        .map_err(|err| AppError::Transport(format!("stdio writer task panicked: {err}")))?
}

/// Writer task: serializes outbound envelopes as NDJSON lines.
///
/// Exits when the channel closes (all dispatch work finished) or the
/// token fires; on cancellation, already-queued responses are still
/// flushed before the task stops.
async fn run_writer<W>(
    mut output: W,
    mut rx: mpsc::Receiver<serde_json::Value>,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("stdio writer: cancellation received, draining");
                while let Ok(value) = rx.try_recv() {
                    write_line(&mut output, &value).await?;
                }
                break;
            }

            msg = rx.recv() => {
                match msg {
                    None => {
                        debug!("stdio writer: channel closed, stopping");
                        break;
                    }
                    Some(value) => write_line(&mut output, &value).await?,
                }
            }
        }
    }

    Ok(())
}

/// Write one envelope as a newline-terminated JSON line and flush.
async fn write_line<W>(output: &mut W, value: &serde_json::Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(value)
        .map_err(|err| AppError::Transport(format!("outbound serialization failed: {err}")))?;
    bytes.push(b'\n');
    output
        .write_all(&bytes)
        .await
        .map_err(|err| AppError::Io(format!("stdout write failed: {err}")))?;
    output
        .flush()
        .await
        .map_err(|err| AppError::Io(format!("stdout flush failed: {err}")))
}
