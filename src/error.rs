//! Error types for Socksd
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for Socksd operations
#[derive(Error, Debug)]
pub enum SocksdError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),
}

/// SOCKS5 specific errors
///
/// Every variant is terminal for the session that produced it.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Wrong username/password sub-negotiation version
    #[error("Invalid auth version: {0}")]
    InvalidAuthVersion(u8),

    /// ULEN was zero
    #[error("Invalid username length: 0")]
    InvalidUsernameLength,

    /// PLEN was zero
    #[error("Invalid password length: 0")]
    InvalidPasswordLength,

    /// Domain length prefix was zero
    #[error("Invalid domain length: 0")]
    InvalidDomainLength,

    /// Authentication failed
    #[error("Authentication failed")]
    AuthFailed,

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid domain name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Reply code outside of the RFC 1928 registry
    #[error("Invalid reply code: {0}")]
    InvalidReplyCode(u8),

    /// Dialing the requested destination failed
    #[error("Failed to connect to {target}: {source}")]
    ConnectFailed {
        /// Dial target as `host:port`
        target: String,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },

    /// IO error, including short reads while decoding a message
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Socks5Error {
    /// Whether the peer closed the stream in the middle of a message
    pub fn is_truncated(&self) -> bool {
        matches!(self, Socks5Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            _ => Err(Socks5Error::InvalidReplyCode(value)),
        }
    }
}

/// Classify a failed dial into the reply sent to the client.
///
/// Anything that is neither refused nor network-unreachable (timeouts,
/// resolution failures, unclassified OS errors) falls back to host unreachable.
impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable => Socks5ReplyCode::NetworkUnreachable,
            _ => Socks5ReplyCode::HostUnreachable,
        }
    }
}
