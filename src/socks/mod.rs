//! SOCKS5 module for socksd
//!
//! This module implements the server side of the SOCKS5 protocol
//! (RFC 1928, with RFC 1929 username/password authentication). It works on
//! any bidirectional byte stream; the listener in [`crate::server`] feeds it
//! accepted TCP connections.

pub mod auth;
pub mod consts;
pub mod proto;
mod session;
mod tcp_relay;
pub mod types;

pub use auth::{AuthMethod, Authenticator, Credentials};
pub use consts::*;
pub use session::handle_socks5_on_stream;
pub use tcp_relay::{handle_tcp_connect, relay_tcp};
pub use types::{SocksCommand, TargetAddr};

use crate::config::ServerConfig;
use crate::error::Socks5Error;
use crate::transport::SocketOpts;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Per-server SOCKS5 settings shared read-only by every session
#[derive(Debug, Clone, Default)]
pub struct Socks5Service {
    authenticator: Authenticator,
    connect_timeout: Option<Duration>,
    socket_opts: SocketOpts,
}

impl Socks5Service {
    /// Create a service with the given authenticator and default options
    pub fn new(authenticator: Authenticator) -> Self {
        Socks5Service {
            authenticator,
            ..Default::default()
        }
    }

    /// Build the service described by a server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Socks5Service {
            authenticator: config.auth.authenticator(),
            connect_timeout: config.connect_timeout.map(Duration::from_secs),
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
        }
    }

    /// Bound the time spent dialing CONNECT targets
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Socket options for dialed upstream connections
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// The configured authenticator
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Dial timeout, if any
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Socket options applied to upstream connections
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }

    /// Run a full SOCKS5 session on `stream`
    pub async fn serve<S>(&self, stream: S) -> Result<(), Socks5Error>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        handle_socks5_on_stream(stream, self).await
    }
}
