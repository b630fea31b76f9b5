//! SOCKS5 wire codec
//!
//! Byte-exact encoding and decoding of the handshake messages defined by
//! [RFC 1928] and the username/password sub-negotiation of [RFC 1929].
//!
//! Decoders read a fixed header first and then the variable-length fields it
//! announces. A stream that ends early yields an `UnexpectedEof` IO error;
//! partial messages are never retried.
//!
//! [RFC 1928]: https://datatracker.ietf.org/doc/html/rfc1928
//! [RFC 1929]: https://datatracker.ietf.org/doc/html/rfc1929

mod auth;
mod negotiation;
mod request;

pub use auth::{UserPassAuthReply, UserPassAuthRequest};
pub use negotiation::{NegotiationReply, NegotiationRequest};
pub use request::{Request, RequestReply};

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write a fully encoded message and flush it
async fn write_message<W>(w: &mut W, buf: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    w.write_all(buf).await?;
    w.flush().await
}
