//! HTTP server setup and request pipeline.
//!
//! # Responsibilities
//! - Build the parser and router from configuration
//! - Run parse → route → encode → format for one frame
//! - Accept connections and spawn one task per connection
//! - Stop accepting on shutdown and drain live connections
//! - Observability (request logs, metrics)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::http::encoding::encode_response;
use crate::http::request::RequestParser;
use crate::http::response::INTERNAL_ERROR_RESPONSE;
use crate::net::connection::{handle_connection, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{Router, RouterSettings};

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the accept loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How long to wait before accepting again, or `None` if the error is fatal.
fn retry_delay(err: &ListenerError) -> Option<Duration> {
    match err {
        ListenerError::Closed => None,
        ListenerError::Accept(_) | ListenerError::Bind(_) => Some(ACCEPT_ERROR_BACKOFF),
    }
}

/// The synchronous request pipeline. Holds no mutable state, so one instance
/// serves every connection concurrently.
#[derive(Debug)]
pub struct Pipeline {
    parser: RequestParser,
    router: Router,
}

impl Pipeline {
    pub fn new(parser: RequestParser, router: Router) -> Self {
        Self { parser, router }
    }

    /// Parser and standard routes as described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let router = Router::standard(RouterSettings {
            files_root: config.files.directory.clone().unwrap_or_default(),
            max_body_bytes: config.limits.max_body_bytes,
            reject_path_traversal: config.files.reject_path_traversal,
        });
        Self::new(RequestParser::new(config.limits), router)
    }

    pub fn parser(&self) -> &RequestParser {
        &self.parser
    }

    /// Turn one request frame into response bytes. Never fails: anything the
    /// routes cannot handle is already a status code by the time it gets here.
    pub fn respond(&self, frame: &[u8]) -> Vec<u8> {
        let start = Instant::now();
        let req = self.parser.parse(frame);
        let (mut resp, route) = self.router.dispatch(&req);
        encode_response(&mut resp, &req.accepted_encodings);

        let status = resp.status.map(|s| s.as_u16()).unwrap_or_default();
        metrics::record_request(req.method.as_str(), status, route, start);
        tracing::info!(
            method = %req.method,
            target = %req.target.escape_ascii(),
            status,
            route,
            encoding = resp.content_encoding.as_deref().unwrap_or("none"),
            "Request handled"
        );

        match resp.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, route, "Failed to format response");
                INTERNAL_ERROR_RESPONSE.to_vec()
            }
        }
    }
}

/// One-request-per-connection HTTP server.
pub struct HttpServer {
    config: Arc<ServerConfig>,
    pipeline: Arc<Pipeline>,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let pipeline = Arc::new(Pipeline::from_config(&config));
        Self {
            config: Arc::new(config),
            pipeline,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                    Err(e) => match retry_delay(&e) {
                        Some(delay) => {
                            tracing::warn!(error = %e, retry_in_ms = delay.as_millis() as u64, "Accept failed");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    },
                },
            }
        }

        self.drain().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let pipeline = Arc::clone(&self.pipeline);
        let read_timeout = Duration::from_secs(self.config.timeouts.read_secs);

        tracing::debug!(connection_id = %guard.id(), peer_addr = %peer, "Client connected");

        tokio::spawn(async move {
            let _permit = permit;
            let parser = *pipeline.parser();
            let result = handle_connection(stream, &guard, &parser, read_timeout, |frame| async move {
                match tokio::task::spawn_blocking(move || pipeline.respond(&frame)).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "Request pipeline panicked");
                        INTERNAL_ERROR_RESPONSE.to_vec()
                    }
                }
            })
            .await;

            if let Err(e) = result {
                tracing::warn!(connection_id = %guard.id(), peer_addr = %peer, error = %e, "Connection error");
            }
        });
    }

    async fn drain(&self) {
        let deadline = Duration::from_secs(self.config.timeouts.shutdown_secs);
        if tokio::time::timeout(deadline, self.tracker.wait_for_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Shutdown deadline reached with connections still open"
            );
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }
}
