//! Connection lifecycle tracking and single-request handling.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track live connections for graceful shutdown
//! - Read one bounded request frame, answer it, close

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::request::RequestParser;
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(count);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed.
    pub async fn wait_for_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let count = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_connections(count);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Read one request frame.
///
/// Reading stops at end of stream, once `max_frame_bytes` have arrived, once the
/// parser reports a complete request, or when `timeout` elapses. Whatever was
/// read by then is the frame.
pub async fn read_frame<S>(stream: &mut S, parser: &RequestParser, timeout: Duration) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let max = parser.limits().max_frame_bytes;
    let mut frame = Vec::with_capacity(max.min(8192));
    let mut chunk = vec![0u8; max];

    let read = async {
        while frame.len() < max {
            let n = stream.read(&mut chunk[..max - frame.len()]).await?;
            if n == 0 {
                break;
            }
            frame.extend_from_slice(&chunk[..n]);
            if parser.parse(&frame).is_complete() {
                break;
            }
        }
        Ok::<_, std::io::Error>(())
    };

    let outcome = tokio::time::timeout(timeout, read).await;
    match outcome {
        Ok(result) => result?,
        Err(_) => {
            tracing::debug!(bytes = frame.len(), "Frame read timed out");
        }
    }
    Ok(frame)
}

/// Serve exactly one request on `stream` and close it.
///
/// `respond` turns the frame into response bytes; it runs on the blocking pool.
pub async fn handle_connection<S, F, Fut>(
    mut stream: S,
    guard: &ConnectionGuard,
    parser: &RequestParser,
    read_timeout: Duration,
    respond: F,
) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnOnce(Vec<u8>) -> Fut,
    Fut: Future<Output = Vec<u8>>,
{
    let frame = read_frame(&mut stream, parser, read_timeout).await?;
    tracing::debug!(connection_id = %guard.id(), bytes = frame.len(), "Frame received");

    let response = respond(frame).await;
    stream.write_all(&response).await?;
    stream.flush().await?;
    stream.shutdown().await?;

    tracing::debug!(connection_id = %guard.id(), bytes = response.len(), "Response sent");
    Ok(())
}
