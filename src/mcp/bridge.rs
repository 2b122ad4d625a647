//! Push-to-pull adapter between session sinks and HTTP stream bodies.
//!
//! The session layer pushes discrete SSE frames as they are produced; the
//! HTTP layer wants a pull-based byte stream it can poll. [`StreamBridge`]
//! is the push side and [`BridgeBody`] the poll side. Dropping the body
//! (the client went away) fires the session's cancellation token through
//! a drop guard, which is how disconnects reach the session manager.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::errors::{AppError, Result};

/// Write-side capabilities the session layer depends on.
///
/// Both the production [`StreamBridge`] and test doubles implement this,
/// keeping session logic independent of any concrete response type.
/// Writing to a torn-down stream is a recoverable error the caller uses
/// to trigger teardown, never a panic.
pub trait EventSink: Send + Sync {
    /// Queue one frame for delivery; frames arrive in write order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] when the stream has ended or the
    /// client is gone.
    fn write(&self, frame: Bytes) -> Result<()>;

    /// End the stream so subsequent writes fail. Idempotent.
    fn end(&self);

    /// Whether the stream can no longer deliver frames.
    fn is_closed(&self) -> bool;
}

/// Push side of the bridge; held by the session.
pub struct StreamBridge {
    tx: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
    committed: AtomicBool,
}

impl StreamBridge {
    /// Create a connected bridge pair.
    ///
    /// The returned body holds a guard on `cancel`: when the HTTP server
    /// drops the body because the client disconnected, the token fires
    /// and the owning session tears itself down.
    #[must_use]
    pub fn channel(cancel: &CancellationToken) -> (Arc<Self>, BridgeBody) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
            committed: AtomicBool::new(false),
        });
        let body = BridgeBody {
            rx,
            _disconnect: cancel.clone().drop_guard(),
        };
        (bridge, body)
    }

    /// Whether at least one frame has been accepted. Response headers are
    /// committed once the first frame is on the wire, so later failures
    /// can only end the stream, not change the status.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    fn sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Bytes>>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for StreamBridge {
    fn write(&self, frame: Bytes) -> Result<()> {
        let guard = self.sender();
        let Some(tx) = guard.as_ref() else {
            return Err(AppError::Transport("stream already ended".to_owned()));
        };
        tx.send(frame)
            .map_err(|_| AppError::Transport("client disconnected".to_owned()))?;
        self.committed.store(true, Ordering::Release);
        Ok(())
    }

    fn end(&self) {
        self.sender().take();
    }

    fn is_closed(&self) -> bool {
        self.sender()
            .as_ref()
            .map_or(true, mpsc::UnboundedSender::is_closed)
    }
}

/// Pull side of the bridge; served as the HTTP response body.
pub struct BridgeBody {
    rx: mpsc::UnboundedReceiver<Bytes>,
    _disconnect: DropGuard,
}

impl Stream for BridgeBody {
    type Item = std::result::Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}
