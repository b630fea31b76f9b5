//! Username/password authentication handler
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use crate::error::Socks5Error;
use crate::socks::proto::{UserPassAuthReply, UserPassAuthRequest};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Immutable username → password map shared by every session.
#[derive(Clone, Default)]
pub struct Credentials {
    users: Arc<HashMap<String, String>>,
}

impl Credentials {
    /// Build the credential set
    pub fn new(users: HashMap<String, String>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    /// Check a username/password pair byte-for-byte
    pub fn verify(&self, username: &[u8], password: &[u8]) -> bool {
        let Ok(username) = std::str::from_utf8(username) else {
            return false;
        };
        self.users
            .get(username)
            .is_some_and(|expected| expected.as_bytes() == password)
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user is configured
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<U: Into<String>, P: Into<String>> FromIterator<(U, P)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (U, P)>>(iter: I) -> Self {
        Credentials::new(
            iter.into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("users", &self.users.len())
            .finish()
    }
}

/// Perform username/password authentication on the stream.
///
/// A malformed request (wrong version, zero-length field) fails without a
/// reply. Otherwise the status reply is written first and only then is a
/// rejection surfaced as [`Socks5Error::AuthFailed`].
pub async fn authenticate_password<S>(
    stream: &mut S,
    credentials: &Credentials,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = UserPassAuthRequest::read_from(stream).await?;
    let success = credentials.verify(&request.username, &request.password);

    UserPassAuthReply::new(success).write_to(stream).await?;

    let username = String::from_utf8_lossy(&request.username);
    if !success {
        debug!("Authentication failed for user: {}", username);
        return Err(Socks5Error::AuthFailed);
    }

    debug!("Authentication successful for user: {}", username);
    Ok(())
}
