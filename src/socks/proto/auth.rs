//! Username/password sub-negotiation messages (RFC 1929)

use super::write_message;
use crate::error::Socks5Error;
use crate::socks::consts::{
    SOCKS5_AUTH_STATUS_FAILURE, SOCKS5_AUTH_STATUS_SUCCESS, SOCKS5_AUTH_VERSION,
};
use bytes::{BufMut, BytesMut};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Credentials presented by the client.
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassAuthRequest {
    /// Sub-negotiation version
    pub version: u8,
    /// Raw username bytes
    pub username: Vec<u8>,
    /// Raw password bytes
    pub password: Vec<u8>,
}

impl UserPassAuthRequest {
    /// Create a version 1 request
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            version: SOCKS5_AUTH_VERSION,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decode a request from the reader.
    ///
    /// Fails on a version other than 1 and on zero-length username or
    /// password, before reading any further field.
    pub async fn read_from<R>(r: &mut R) -> Result<Self, Socks5Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 2];
        r.read_exact(&mut header).await?;

        let version = header[0];
        if version != SOCKS5_AUTH_VERSION {
            return Err(Socks5Error::InvalidAuthVersion(version));
        }

        let username_len = header[1] as usize;
        if username_len == 0 {
            return Err(Socks5Error::InvalidUsernameLength);
        }
        let mut username = vec![0u8; username_len];
        r.read_exact(&mut username).await?;

        let password_len = r.read_u8().await? as usize;
        if password_len == 0 {
            return Err(Socks5Error::InvalidPasswordLength);
        }
        let mut password = vec![0u8; password_len];
        r.read_exact(&mut password).await?;

        Ok(Self {
            version,
            username,
            password,
        })
    }

    /// Encode the request into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.username.len() as u8);
        buf.put_slice(&self.username);
        buf.put_u8(self.password.len() as u8);
        buf.put_slice(&self.password);
    }

    /// Encode the request and write it to the writer
    pub async fn write_to<W>(&self, w: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(3 + self.username.len() + self.password.len());
        self.write_to_buf(&mut buf);
        write_message(w, &buf).await
    }
}

// Keep passwords out of logs
impl fmt::Debug for UserPassAuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassAuthRequest")
            .field("version", &self.version)
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"***")
            .finish()
    }
}

/// Server verdict on the presented credentials.
///
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPassAuthReply {
    /// Sub-negotiation version
    pub version: u8,
    /// 0x00 on success, 0xFF on failure
    pub status: u8,
}

impl UserPassAuthReply {
    /// Create a reply for the given verdict
    pub fn new(success: bool) -> Self {
        Self {
            version: SOCKS5_AUTH_VERSION,
            status: if success {
                SOCKS5_AUTH_STATUS_SUCCESS
            } else {
                SOCKS5_AUTH_STATUS_FAILURE
            },
        }
    }

    /// Whether the reply reports success
    pub fn is_success(&self) -> bool {
        self.status == SOCKS5_AUTH_STATUS_SUCCESS
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
            status: buf[1],
        })
    }

    /// Encode the reply into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.status);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(username: &[u8], password: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        UserPassAuthRequest::new(username, password).write_to_buf(&mut buf);
        buf
    }

    #[test]
    fn test_request_format() {
        let request = encode(b"admin", b"secret123");

        assert_eq!(request[0], SOCKS5_AUTH_VERSION);
        assert_eq!(request[1], 5);
        assert_eq!(&request[2..7], b"admin");
        assert_eq!(request[7], 9);
        assert_eq!(&request[8..17], b"secret123");
    }

    #[tokio::test]
    async fn test_read_request() {
        let mut cursor = Cursor::new(encode(b"alice", b"secret"));

        let req = UserPassAuthRequest::read_from(&mut cursor).await.unwrap();
        assert_eq!(req.username, b"alice");
        assert_eq!(req.password, b"secret");
    }

    #[tokio::test]
    async fn test_read_request_invalid_version() {
        let mut request = encode(b"user", b"pass");
        request[0] = 0x05;

        let err = UserPassAuthRequest::read_from(&mut Cursor::new(request))
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidAuthVersion(0x05)));
    }

    #[tokio::test]
    async fn test_read_request_zero_username_length() {
        let request = vec![SOCKS5_AUTH_VERSION, 0, 4, b'p', b'a', b's', b's'];

        let err = UserPassAuthRequest::read_from(&mut Cursor::new(request))
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidUsernameLength));
    }

    #[tokio::test]
    async fn test_read_request_zero_password_length() {
        let request = vec![SOCKS5_AUTH_VERSION, 4, b'u', b's', b'e', b'r', 0];

        let err = UserPassAuthRequest::read_from(&mut Cursor::new(request))
            .await
            .unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidPasswordLength));
    }

    #[tokio::test]
    async fn test_read_request_truncated_password() {
        let mut request = encode(b"user", b"password");
        request.truncate(request.len() - 3);

        let err = UserPassAuthRequest::read_from(&mut Cursor::new(request))
            .await
            .unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_debug_hides_password() {
        let req = UserPassAuthRequest::new("alice", "secret");
        let debug = format!("{:?}", req);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_write_reply() {
        let mut buffer = Vec::new();
        UserPassAuthReply::new(true).write_to(&mut buffer).await.unwrap();
        UserPassAuthReply::new(false).write_to(&mut buffer).await.unwrap();

        assert_eq!(buffer, vec![0x01, 0x00, 0x01, 0xFF]);
    }
}
