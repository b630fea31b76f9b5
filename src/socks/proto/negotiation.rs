//! Method negotiation messages

use super::write_message;
use crate::error::Socks5Error;
use crate::socks::consts::SOCKS5_VERSION;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Client greeting listing the authentication methods it supports.
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationRequest {
    /// Protocol version, validated by the caller
    pub version: u8,
    /// Method identifiers in client preference order
    pub methods: Vec<u8>,
}

impl NegotiationRequest {
    /// Create a SOCKS5 greeting offering `methods`
    pub fn new(methods: Vec<u8>) -> Self {
        Self {
            version: SOCKS5_VERSION,
            methods,
        }
    }

    /// Decode a greeting from the reader
    pub async fn read_from<R>(r: &mut R) -> Result<Self, Socks5Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 2];
        r.read_exact(&mut header).await?;

        let mut methods = vec![0u8; header[1] as usize];
        r.read_exact(&mut methods).await?;

        Ok(Self {
            version: header[0],
            methods,
        })
    }

    /// Encode the greeting into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        debug_assert!(self.methods.len() <= u8::MAX as usize);
        buf.put_u8(self.version);
        buf.put_u8(self.methods.len() as u8);
        buf.put_slice(&self.methods);
    }

    /// Encode the greeting and write it to the writer
    pub async fn write_to<W>(&self, w: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(2 + self.methods.len());
        self.write_to_buf(&mut buf);
        write_message(w, &buf).await
    }
}

/// Server choice of authentication method.
///
/// ```text
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationReply {
    /// Protocol version
    pub version: u8,
    /// Chosen method, or 0xFF when none of the offered methods is acceptable
    pub method: u8,
}

impl NegotiationReply {
    /// Create a SOCKS5 reply selecting `method`
    pub fn new(method: u8) -> Self {
        Self {
            version: SOCKS5_VERSION,
            method,
        }
    }

    /// Decode a reply from the reader
    pub async fn read_from<R>(r: &mut R) -> Result<Self, Socks5Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        r.read_exact(&mut buf).await?;
        Ok(Self {
            version: buf[0],
            method: buf[1],
        })
    }

    /// Encode the reply into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.method);
    }

    /// Encode the reply and write it to the writer
    pub async fn write_to<W>(&self, w: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(2);
        self.write_to_buf(&mut buf);
        write_message(w, &buf).await
    }
}
