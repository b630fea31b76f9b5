//! TCP plumbing shared by the listener and the CONNECT handler
//!
//! Socket options applied to every client and upstream connection, and the
//! outbound dial used for CONNECT requests.

use crate::config::TcpConfig;
use crate::socks::TargetAddr;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP socket options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs),
            keepalive_interval: Some(config.keepalive_interval),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }

    /// Apply options, logging instead of failing
    pub fn hint(&self, stream: &TcpStream) {
        if let Err(e) = self.apply(stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }
    }
}

/// Dial `target` over TCP.
///
/// Domain names are resolved here. An elapsed `timeout` is reported as
/// [`io::ErrorKind::TimedOut`].
pub async fn connect_tcp(target: &TargetAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let connect = async {
        match target {
            TargetAddr::Ip(addr) => TcpStream::connect(addr).await,
            TargetAddr::Domain(domain, port) => TcpStream::connect((domain.as_str(), *port)).await,
        }
    };

    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, connect).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("Connection timeout to {}", target),
            )
        })?,
        None => connect.await,
    }
}
