//! SOCKS5 type definitions
//!
//! Defines the command and address types shared by the codec, the session
//! state machine and the CONNECT handler.

use super::consts::*;
use crate::error::Socks5Error;
use bytes::BufMut;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for incoming connection (not implemented)
    Bind,
    /// UDP ASSOCIATE - establish UDP relay (not implemented)
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }

    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Target address for SOCKS5 requests
///
/// Represents the destination address in a SOCKS5 request.
/// Can be an IP address (v4 or v6) or a domain name. Domain names are kept
/// as sent by the client; resolution happens when the target is dialed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Interpret the address fields of a decoded request.
    ///
    /// `addr` holds the raw DST.ADDR bytes without the domain length prefix.
    pub fn from_wire(addr_type: u8, addr: &[u8], port: u16) -> Result<Self, Socks5Error> {
        match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => {
                let octets: [u8; 4] = addr.try_into().map_err(|_| {
                    Socks5Error::InvalidAddress(format!("IPv4 address of {} bytes", addr.len()))
                })?;
                Ok(TargetAddr::ipv4(Ipv4Addr::from(octets), port))
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let octets: [u8; 16] = addr.try_into().map_err(|_| {
                    Socks5Error::InvalidAddress(format!("IPv6 address of {} bytes", addr.len()))
                })?;
                Ok(TargetAddr::ipv6(Ipv6Addr::from(octets), port))
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                if addr.is_empty() {
                    return Err(Socks5Error::InvalidDomainLength);
                }
                let domain = String::from_utf8(addr.to_vec()).map_err(|e| {
                    Socks5Error::InvalidDomain(String::from_utf8_lossy(e.as_bytes()).into_owned())
                })?;
                Ok(TargetAddr::Domain(domain, port))
            }
            other => Err(Socks5Error::AddressTypeNotSupported(other)),
        }
    }

    /// Zeroed bind address used in failure replies.
    ///
    /// IPv6 requests get `[::]:0`, everything else `0.0.0.0:0`.
    pub fn unspecified(addr_type: u8) -> SocketAddr {
        match addr_type {
            SOCKS5_ADDR_TYPE_IPV6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
            _ => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        }
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// Raw DST.ADDR / BND.ADDR bytes, without a length prefix
    pub fn addr_bytes(&self) -> Vec<u8> {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => addr.ip().octets().to_vec(),
            TargetAddr::Ip(SocketAddr::V6(addr)) => addr.ip().octets().to_vec(),
            TargetAddr::Domain(domain, _) => domain.as_bytes().to_vec(),
        }
    }

    /// Textual `host:port` dial target. IPv6 literals are bracketed.
    pub fn dial_target(&self) -> String {
        self.to_string()
    }

    /// Write ATYP, address and port in SOCKS5 wire format
    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                buf.put_u8(SOCKS5_ADDR_TYPE_IPV4);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                buf.put_u8(SOCKS5_ADDR_TYPE_IPV6);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            TargetAddr::Domain(domain, port) => {
                buf.put_u8(SOCKS5_ADDR_TYPE_DOMAIN);
                buf.put_u8(domain.len() as u8);
                buf.put_slice(domain.as_bytes());
                buf.put_u16(*port);
            }
        }
    }

    /// Number of bytes written by [`TargetAddr::write_to_buf`]
    pub fn serialized_len(&self) -> usize {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => 1 + 4 + 2,
            TargetAddr::Ip(SocketAddr::V6(_)) => 1 + 16 + 2,
            TargetAddr::Domain(domain, _) => 1 + 1 + domain.len() + 2,
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}
