//! Connection request and reply messages

use super::write_message;
use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr};
use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Connection request sent after authentication.
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Fields are kept as received so the session can decide how to reject
/// unknown versions, commands and address types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Protocol version
    pub version: u8,
    /// Raw command byte
    pub command: u8,
    /// Raw address type byte
    pub addr_type: u8,
    /// DST.ADDR without the domain length prefix
    pub dst_addr: Vec<u8>,
    /// DST.PORT
    pub dst_port: u16,
}

impl Request {
    /// Create a SOCKS5 request for `command` towards `target`
    pub fn new(command: SocksCommand, target: &TargetAddr) -> Self {
        Self {
            version: SOCKS5_VERSION,
            command: command.to_byte(),
            addr_type: target.addr_type(),
            dst_addr: target.addr_bytes(),
            dst_port: target.port(),
        }
    }

    /// Decode a request from the reader.
    ///
    /// An unrecognized address type cannot be framed, so the address is left
    /// empty and the next 2 bytes are read as the port.
    pub async fn read_from<R>(r: &mut R) -> Result<Self, Socks5Error>
    where
        R: AsyncRead + Unpin,
    {
        // VER CMD RSV ATYP
        let mut header = [0u8; 4];
        r.read_exact(&mut header).await?;

        let version = header[0];
        let command = header[1];
        let addr_type = header[3];

        let dst_addr = match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut addr = vec![0u8; 4];
                r.read_exact(&mut addr).await?;
                addr
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut addr = vec![0u8; 16];
                r.read_exact(&mut addr).await?;
                addr
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let len = r.read_u8().await? as usize;
                if len == 0 {
                    return Err(Socks5Error::InvalidDomainLength);
                }
                let mut domain = vec![0u8; len];
                r.read_exact(&mut domain).await?;
                domain
            }
            // No length to frame it by; only the port follows
            _ => Vec::new(),
        };

        let dst_port = r.read_u16().await?;

        Ok(Self {
            version,
            command,
            addr_type,
            dst_addr,
            dst_port,
        })
    }

    /// The command, if it is one of CONNECT, BIND or UDP ASSOCIATE
    pub fn command(&self) -> Option<SocksCommand> {
        SocksCommand::from_byte(self.command)
    }

    /// Interpret the address fields as a dialable target
    pub fn target_addr(&self) -> Result<TargetAddr, Socks5Error> {
        TargetAddr::from_wire(self.addr_type, &self.dst_addr, self.dst_port)
    }

    /// Encode the request into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.command);
        buf.put_u8(SOCKS5_RESERVED);
        buf.put_u8(self.addr_type);
        if self.addr_type == SOCKS5_ADDR_TYPE_DOMAIN {
            buf.put_u8(self.dst_addr.len() as u8);
        }
        buf.put_slice(&self.dst_addr);
        buf.put_u16(self.dst_port);
    }

    /// Encode the request and write it to the writer
    pub async fn write_to<W>(&self, w: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(4 + 1 + self.dst_addr.len() + 2);
        self.write_to_buf(&mut buf);
        write_message(w, &buf).await
    }
}

/// Server reply to a connection request.
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestReply {
    /// Protocol version
    pub version: u8,
    /// Reply code
    pub reply: Socks5ReplyCode,
    /// BND.ADDR and BND.PORT
    pub bind_addr: SocketAddr,
}

impl RequestReply {
    /// Create a reply with an explicit bind address
    pub fn new(reply: Socks5ReplyCode, bind_addr: SocketAddr) -> Self {
        Self {
            version: SOCKS5_VERSION,
            reply,
            bind_addr,
        }
    }

    /// Success reply carrying the local endpoint of the upstream connection
    pub fn success(bind_addr: SocketAddr) -> Self {
        Self::new(Socks5ReplyCode::Succeeded, bind_addr)
    }

    /// Failure reply with a zeroed address in the family of the request
    pub fn failure(reply: Socks5ReplyCode, request_addr_type: u8) -> Self {
        Self::new(reply, TargetAddr::unspecified(request_addr_type))
    }

    /// Decode a reply from the reader.
    ///
    /// Only IP bind addresses are accepted; this server never sends a domain.
    pub async fn read_from<R>(r: &mut R) -> Result<Self, Socks5Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; 4];
        r.read_exact(&mut header).await?;

        let reply = Socks5ReplyCode::try_from(header[1])?;
        let ip = match header[3] {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let mut octets = [0u8; 4];
                r.read_exact(&mut octets).await?;
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut octets = [0u8; 16];
                r.read_exact(&mut octets).await?;
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            other => return Err(Socks5Error::AddressTypeNotSupported(other)),
        };
        let port = r.read_u16().await?;

        Ok(Self {
            version: header[0],
            reply,
            bind_addr: SocketAddr::new(ip, port),
        })
    }

    /// Encode the reply into the buffer
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.reply.into());
        buf.put_u8(SOCKS5_RESERVED);
        TargetAddr::Ip(self.bind_addr).write_to_buf(buf);
    }

    /// Encode the reply and write it to the writer
    pub async fn write_to<W>(&self, w: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(self.serialized_len());
        self.write_to_buf(&mut buf);
        write_message(w, &buf).await
    }

    fn serialized_len(&self) -> usize {
        3 + TargetAddr::Ip(self.bind_addr).serialized_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn create_connect_request_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        request.extend_from_slice(&ip);
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    fn create_connect_request_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        request.extend_from_slice(domain.as_bytes());
        request.extend_from_slice(&port.to_be_bytes());
        request
    }

    #[tokio::test]
    async fn test_read_request_ipv4() {
        let mut cursor = Cursor::new(create_connect_request_ipv4([192, 168, 1, 1], 8080));

        let req = Request::read_from(&mut cursor).await.unwrap();
        assert_eq!(req.command(), Some(SocksCommand::Connect));
        assert_eq!(
            req.target_addr().unwrap(),
            TargetAddr::ipv4(Ipv4Addr::new(192, 168, 1, 1), 8080)
        );
    }

    #[tokio::test]
    async fn test_read_request_domain() {
        let mut cursor = Cursor::new(create_connect_request_domain("example.com", 443));

        let req = Request::read_from(&mut cursor).await.unwrap();
        assert_eq!(req.dst_addr, b"example.com");
        assert_eq!(req.target_addr().unwrap().dial_target(), "example.com:443");
    }

    #[tokio::test]
    async fn test_read_request_ipv6() {
        let mut request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV6,
        ];
        request.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        request.extend_from_slice(&80u16.to_be_bytes());

        let req = Request::read_from(&mut Cursor::new(request)).await.unwrap();
        assert_eq!(req.target_addr().unwrap().dial_target(), "[::1]:80");
    }

    #[tokio::test]
    async fn test_read_request_zero_domain_length() {
        let request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            0,
            0,
            80,
        ];

        let err = Request::read_from(&mut Cursor::new(request)).await.unwrap_err();
        assert!(matches!(err, Socks5Error::InvalidDomainLength));
    }

    #[tokio::test]
    async fn test_read_request_unknown_address_type() {
        let request = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            0x02,
            0x1F,
            0x90,
        ];

        let mut cursor = Cursor::new(request);
        let req = Request::read_from(&mut cursor).await.unwrap();
        assert_eq!(req.addr_type, 0x02);
        assert!(req.dst_addr.is_empty());
        assert_eq!(req.dst_port, 8080);
        // The port bytes were consumed
        assert_eq!(cursor.position(), 6);
        assert!(matches!(
            req.target_addr(),
            Err(Socks5Error::AddressTypeNotSupported(0x02))
        ));
    }

    #[tokio::test]
    async fn test_read_request_keeps_unknown_command() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request[1] = 0x99;

        let req = Request::read_from(&mut Cursor::new(request)).await.unwrap();
        assert_eq!(req.command, 0x99);
        assert_eq!(req.command(), None);
    }

    #[tokio::test]
    async fn test_read_request_truncated_port() {
        let mut request = create_connect_request_ipv4([127, 0, 0, 1], 80);
        request.pop();

        let err = Request::read_from(&mut Cursor::new(request)).await.unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_request_encoding_matches_wire() {
        let target = TargetAddr::domain("example.com", 443);
        let mut buf = Vec::new();
        Request::new(SocksCommand::Connect, &target).write_to_buf(&mut buf);

        assert_eq!(buf, create_connect_request_domain("example.com", 443));
    }

    #[test]
    fn test_reply_bytes_ipv4() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 8080);
        let mut reply = Vec::new();
        RequestReply::success(addr).write_to_buf(&mut reply);

        assert_eq!(reply[0], SOCKS5_VERSION);
        assert_eq!(reply[1], 0x00);
        assert_eq!(reply[2], SOCKS5_RESERVED);
        assert_eq!(reply[3], SOCKS5_ADDR_TYPE_IPV4);
        assert_eq!(&reply[4..8], &[192, 168, 1, 1]);
        assert_eq!(&reply[8..10], &8080u16.to_be_bytes());
    }

    #[test]
    fn test_reply_bytes_ipv6() {
        let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        let mut reply = Vec::new();
        RequestReply::success(addr).write_to_buf(&mut reply);

        assert_eq!(reply[3], SOCKS5_ADDR_TYPE_IPV6);
        assert_eq!(reply.len(), 3 + 1 + 16 + 2);
    }

    #[test]
    fn test_failure_reply_is_zeroed() {
        let mut reply = Vec::new();
        RequestReply::failure(Socks5ReplyCode::CommandNotSupported, SOCKS5_ADDR_TYPE_DOMAIN)
            .write_to_buf(&mut reply);
        assert_eq!(reply, vec![0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);

        let mut reply = Vec::new();
        RequestReply::failure(Socks5ReplyCode::HostUnreachable, SOCKS5_ADDR_TYPE_IPV6)
            .write_to_buf(&mut reply);
        assert_eq!(reply[1], 0x04);
        assert_eq!(reply[3], SOCKS5_ADDR_TYPE_IPV6);
        assert!(reply[4..].iter().all(|b| *b == 0));
    }

    #[tokio::test]
    async fn test_reply_read_back() {
        let addr: SocketAddr = "10.0.0.1:9090".parse().unwrap();
        let mut buffer = Vec::new();
        RequestReply::success(addr).write_to(&mut buffer).await.unwrap();

        let reply = RequestReply::read_from(&mut Cursor::new(buffer)).await.unwrap();
        assert_eq!(reply.reply, Socks5ReplyCode::Succeeded);
        assert_eq!(reply.bind_addr, addr);
    }
}
