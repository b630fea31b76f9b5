//! TCP listener and accept loop
//!
//! Every accepted connection runs a SOCKS5 session in its own task. A
//! shutdown signal stops accepting, closes every in-flight session and waits
//! for their tasks to finish.

use crate::config::ServerConfig;
use crate::error::SocksdError;
use crate::socks::Socks5Service;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// SOCKS5 server
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Settings shared by all sessions
    service: Arc<Socks5Service>,
}

impl Server {
    /// Create a new server from a validated configuration
    pub fn new(config: ServerConfig) -> Result<Self, SocksdError> {
        config.validate().map_err(SocksdError::Config)?;
        let service = Arc::new(Socks5Service::from_config(&config));
        Ok(Server { config, service })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind `listen_addr` and serve until shutdown
    pub async fn run(self, shutdown_rx: broadcast::Receiver<bool>) -> Result<(), SocksdError> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        self.serve(listener, shutdown_rx).await
    }

    /// Serve connections from an already bound listener until shutdown.
    ///
    /// The signal is a message on `shutdown_rx` or every sender being
    /// dropped. Returns once all session tasks have ended.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<bool>,
    ) -> Result<(), SocksdError> {
        info!("SOCKS5 server listening on {}", listener.local_addr()?);
        info!("Authentication: {:?}", self.service.authenticator().kind());

        let mut sessions = JoinSet::new();
        // Level-triggered, so a session spawned after the signal still sees it
        let (closing_tx, closing_rx) = watch::channel(false);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!("Accept error: {}", e);
                            tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                            continue;
                        }
                    };

                    debug!("Accepted connection from {}", peer);
                    self.service.socket_opts().hint(&stream);

                    let service = Arc::clone(&self.service);
                    let closing = closing_rx.clone();
                    let session = async move {
                        tokio::select! {
                            result = service.serve(stream) => match result {
                                Ok(()) => debug!("Session finished"),
                                Err(e) if e.is_truncated() => debug!("Client went away: {}", e),
                                Err(e) => warn!("Session error: {}", e),
                            },
                            _ = closed(closing) => {
                                debug!("Session closed by shutdown");
                            }
                        }
                    };
                    sessions.spawn(session.instrument(info_span!("socks5_session", %peer)));
                }

                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("Session task panicked: {}", e);
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);
        closing_tx.send_replace(true);

        let in_flight = sessions.len();
        if in_flight > 0 {
            info!("Closing {} active session(s)", in_flight);
        }
        while sessions.join_next().await.is_some() {}

        info!("Server stopped");
        Ok(())
    }
}

/// Resolve once the server starts closing sessions
async fn closed(mut closing: watch::Receiver<bool>) {
    // The sender outlives every session task
    let _ = closing.wait_for(|closing| *closing).await;
}
