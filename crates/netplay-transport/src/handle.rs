//! Client-role connect handle.
//!
//! [`TransportHandle`] starts a single asynchronous connect attempt on a
//! background task and marshals the completion back to the owner thread
//! through a channel. The owner polls [`TransportHandle::poll_complete`]
//! from its update cycle, so the completion is never delivered concurrently
//! with owner-thread calls.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::WebSocketConnection;

/// The outcome of a connect attempt.
pub enum ConnectEvent {
    /// The connection was established.
    Connected(WebSocketConnection),
    /// The connection attempt failed.
    Failed,
}

/// An in-flight (or completed) outbound connection attempt.
///
/// Exactly one [`ConnectEvent`] is produced per handle. Dropping the handle
/// before completion abandons the attempt.
pub struct TransportHandle {
    events: mpsc::UnboundedReceiver<ConnectEvent>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    /// Starts connecting to `addr` ("host:port") on the given runtime.
    ///
    /// Returns immediately; the result arrives via
    /// [`poll_complete`](Self::poll_complete) on a later update cycle.
    pub fn connect(addr: String, io: &Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = io.spawn(async move {
            let event = match WebSocketConnection::connect(&addr).await {
                Ok(conn) => ConnectEvent::Connected(conn),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    ConnectEvent::Failed
                }
            };
            let _ = tx.send(event);
        });
        Self { events: rx, task }
    }

    /// Polls for the connect completion without blocking.
    ///
    /// Returns `None` while the attempt is still in flight (or after the
    /// single event has already been taken).
    pub fn poll_complete(&mut self) -> Option<ConnectEvent> {
        self.events.try_recv().ok()
    }

    /// Cancels the connect attempt.
    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
