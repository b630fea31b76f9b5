//! SOCKS5 authentication module
//!
//! The server is configured with exactly one authenticator. Its method byte
//! is what negotiation looks for in the client's method list, and its
//! `authenticate` runs once negotiation has selected it.

mod password;

pub use password::{authenticate_password, Credentials};

use super::consts::*;
use crate::error::Socks5Error;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

/// Authentication method types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// No authentication required
    #[default]
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

/// The authenticator a server runs after method negotiation
#[derive(Debug, Clone, Default)]
pub enum Authenticator {
    /// Accept every client without a sub-negotiation
    #[default]
    None,
    /// RFC 1929 username/password against a fixed credential set
    UserPassword(Credentials),
}

impl Authenticator {
    /// Create a username/password authenticator
    pub fn user_password(credentials: Credentials) -> Self {
        Authenticator::UserPassword(credentials)
    }

    /// The method this authenticator implements
    pub fn kind(&self) -> AuthMethod {
        match self {
            Authenticator::None => AuthMethod::None,
            Authenticator::UserPassword(_) => AuthMethod::Password,
        }
    }

    /// SOCKS5 method byte advertised during negotiation
    pub fn method(&self) -> u8 {
        self.kind().to_byte()
    }

    /// Run the sub-negotiation on the stream.
    ///
    /// `None` neither reads nor writes.
    pub async fn authenticate<S>(&self, stream: &mut S) -> Result<(), Socks5Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self {
            Authenticator::None => Ok(()),
            Authenticator::UserPassword(credentials) => {
                authenticate_password(stream, credentials).await
            }
        }
    }
}

/// Select the reply method for a client greeting.
///
/// Returns the first offered method equal to `server_method`, or the
/// "no acceptable methods" sentinel.
pub fn select_auth_method(methods: &[u8], server_method: u8) -> u8 {
    methods
        .iter()
        .copied()
        .find(|m| *m == server_method)
        .unwrap_or(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE)
}
