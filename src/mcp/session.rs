//! Streaming session lifecycle: registration, keep-alive, teardown.
//!
//! Each SSE connection is one [`Session`]. The [`SessionManager`] owns the
//! id-to-session map; every mutation of that map goes through it, so a
//! failed write, a client disconnect, and an explicit close all converge
//! on the same idempotent teardown path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::mcp::bridge::EventSink;
use crate::mcp::envelope::ResponseEnvelope;

/// One live streaming connection.
pub struct Session {
    /// Opaque, unpredictable session identifier.
    pub id: String,
    /// When the connection was registered.
    pub created_at: DateTime<Utc>,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Session {
    /// Serialize `response` and push it as a `message` event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the
    /// underlying stream is gone; callers react by closing the session.
    pub fn deliver(&self, response: &ResponseEnvelope) -> Result<()> {
        let payload = serde_json::to_string(response).unwrap_or_else(|_| {
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"response serialization failed"}}"#
                .to_owned()
        });
        self.send_event("message", &payload)
    }

    /// Token fired when the session is torn down or the client disconnects.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Push one named SSE event through the sink.
    fn send_event(&self, event: &str, data: &str) -> Result<()> {
        self.sink.write(encode_sse_frame(event, data))
    }
}

/// Owns every live session and serializes registry mutations.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
    keep_alive: Duration,
}

impl SessionManager {
    /// Create a manager issuing keep-alive pings at `keep_alive` intervals.
    #[must_use]
    pub fn new(keep_alive: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            keep_alive,
        }
    }

    /// Register a new session over `sink` and emit the opening handshake.
    ///
    /// The session is inserted into the registry before the `endpoint`
    /// event is written, so an inbound POST can address it as soon as the
    /// client sees the URL. The handshake is the `endpoint` event carrying
    /// the paired-endpoint URL, then a `connected` acknowledgment; a
    /// background task then owns the keep-alive timer and tears the
    /// session down when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the
    /// handshake cannot be written; the half-registered session is removed
    /// again before returning.
    pub async fn open(
        self: &Arc<Self>,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Result<Arc<Session>> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session {
            id: id.clone(),
            created_at: Utc::now(),
            sink,
            cancel: cancel.clone(),
        });

        self.sessions
            .lock()
            .await
            .insert(id.clone(), Arc::clone(&session));
        info!(session_id = %id, "session registered");

        let handshake = session
            .send_event("endpoint", &format!("/message?sessionId={id}"))
            .and_then(|()| {
                let ack = serde_json::json!({ "sessionId": id }).to_string();
                session.send_event("connected", &ack)
            });
        if let Err(err) = handshake {
            warn!(session_id = %id, %err, "handshake write failed");
            self.close(&id).await;
            return Err(err);
        }

        let manager = Arc::clone(self);
        let task_session = Arc::clone(&session);
        tokio::spawn(async move {
            manager.run_keep_alive(task_session, cancel).await;
        });

        Ok(session)
    }

    /// Look up a live session by id.
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Tear down a session: deregister it, cancel its token, end its sink.
    ///
    /// Idempotent; returns whether the id was still registered. Once a
    /// session is closed its id never matches an inbound message again.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id);
        match removed {
            Some(session) => {
                session.cancel.cancel();
                session.sink.end();
                info!(session_id = %id, "session closed");
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Keep-alive loop: pings until the session ends, then tears down.
    ///
    /// A failed ping means the client is gone, so both exits of the loop
    /// converge on [`SessionManager::close`].
    async fn run_keep_alive(&self, session: Arc<Session>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.keep_alive);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately; consume it
        // so pings start one full interval after the handshake.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!(session_id = %session.id, "session cancelled");
                    break;
                }

                _ = interval.tick() => {
                    if let Err(err) = session.send_event("ping", &Utc::now().to_rfc3339()) {
                        debug!(session_id = %session.id, %err, "keep-alive write failed");
                        break;
                    }
                }
            }
        }

        self.close(&session.id).await;
    }
}

/// Encode one SSE frame: an `event:` line, `data:` lines, a blank line.
fn encode_sse_frame(event: &str, data: &str) -> Bytes {
    let mut frame = String::with_capacity(event.len() + data.len() + 16);
    frame.push_str("event: ");
    frame.push_str(event);
    frame.push('\n');
    if data.is_empty() {
        frame.push_str("data:\n");
    } else {
        for line in data.lines() {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }
    }
    frame.push('\n');
    Bytes::from(frame)
}
