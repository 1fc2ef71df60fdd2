//! Accept loop and per-connection request handling.
//!
//! # Responsibilities
//! - Accept connections until shutdown is requested
//! - Spawn one task per connection that owns its `Request`
//! - Parse one request, run the handler, write one response, close
//! - Answer parse failures with 400/500 where the peer can still listen
//! - Drain in-flight connections on shutdown, with a deadline

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::Instrument;

use crate::config::{ParserConfig, ServerConfig};
use crate::http::handler::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::lifecycle::ShutdownReceiver;
use crate::net::connection::{close_gracefully, ConnectionGuard, ConnectionTracker};
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;

/// Per-connection settings copied into every task.
#[derive(Debug, Clone)]
struct ConnectionSettings {
    parser: ParserConfig,
    linger: Duration,
}

/// HTTP/1.1 server: one request and one response per connection.
pub struct Server {
    listener: Listener,
    handler: Arc<dyn Handler>,
    tracker: ConnectionTracker,
    settings: ConnectionSettings,
    shutdown_grace: Duration,
}

impl Server {
    /// Bind the listener described by `config`.
    pub async fn bind<H: Handler>(config: &ServerConfig, handler: H) -> Result<Self, ListenerError> {
        let listener = Listener::bind(&config.listener).await?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
            tracker: ConnectionTracker::new(),
            settings: ConnectionSettings {
                parser: config.parser.clone(),
                linger: Duration::from_millis(config.timeouts.linger_ms),
            },
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Handle to the live-connection count.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn serve(self, mut shutdown: ShutdownReceiver) -> Result<(), std::io::Error> {
        let addr = self.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.listener.max_connections(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let guard = self.tracker.track();
                        let handler = Arc::clone(&self.handler);
                        let settings = self.settings.clone();
                        let span = tracing::info_span!(
                            "connection",
                            connection_id = %guard.id(),
                            peer_addr = %peer_addr,
                        );
                        tokio::spawn(
                            async move {
                                handle_connection(stream, guard, handler.as_ref(), &settings).await;
                                drop(permit);
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        if shutdown.is_triggered() {
                            break;
                        }
                        tracing::error!(error = %e, "Error accepting connection");
                    }
                },
            }
        }

        // Closes the listening socket.
        drop(self.listener);

        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(connections = in_flight, "Draining connections");
            if tokio::time::timeout(self.shutdown_grace, self.tracker.wait_until_idle())
                .await
                .is_err()
            {
                tracing::warn!(
                    connections = self.tracker.active_count(),
                    grace_secs = self.shutdown_grace.as_secs(),
                    "Drain deadline passed, abandoning connections"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    _guard: ConnectionGuard,
    handler: &dyn Handler,
    settings: &ConnectionSettings,
) {
    let response = match Request::from_reader(&mut stream, &settings.parser).await {
        Ok(request) => {
            if let Some(line) = request.request_line() {
                tracing::debug!(
                    method = %line.method(),
                    target = line.request_target(),
                    body_len = request.body().len(),
                    "Request parsed"
                );
                metrics::record_request(line.method().as_str(), request.body().len());
            }
            handler.handle(&request)
        }
        Err(err) => {
            metrics::record_parse_error(err.kind());
            match err.status_code() {
                Some(status) => {
                    tracing::warn!(error = %err, status = status.as_u16(), "Rejecting request");
                    Response::from_status(status)
                }
                None => {
                    tracing::debug!(error = %err, "Closing connection without response");
                    close_gracefully(&mut stream, settings.linger).await;
                    return;
                }
            }
        }
    };

    match response.write_to(&mut stream).await {
        Ok(()) => metrics::record_response(response.status.as_u16()),
        Err(e) => tracing::warn!(error = %e, "Failed to write response"),
    }
    close_gracefully(&mut stream, settings.linger).await;
}
