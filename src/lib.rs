//! # socksd - SOCKS5 Proxy Server
//!
//! socksd accepts TCP connections from SOCKS5 clients, negotiates an
//! authentication method, optionally verifies a username and password, and
//! relays bytes between the client and the requested target.
//!
//! ## Features
//!
//! - **RFC 1928 CONNECT**: IPv4, IPv6 and domain-name targets
//! - **RFC 1929 Authentication**: username/password against a fixed user table
//! - **Precise Replies**: dial failures are mapped to refused, network
//!   unreachable or host unreachable
//! - **Clean Shutdown**: a broadcast signal stops the listener and closes
//!   every open session
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksd::config::load_config;
//! use socksd::server::Server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     Server::new(config.server)?.run(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> socksd -> Target
//! ```
//!
//! The protocol layer in [`socks`] only needs an `AsyncRead + AsyncWrite`
//! stream, so sessions can be driven over in-memory pipes in tests.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config, ServerConfig};
pub use error::{Socks5Error, Socks5ReplyCode, SocksdError};
pub use server::Server;
pub use socks::{Authenticator, Credentials, Socks5Service};

/// Version of the socksd library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
