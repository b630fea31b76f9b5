//! Test utilities for socksd
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksd::config::{AuthConfig, ServerConfig};
use socksd::socks::AuthMethod;
use socksd::{Server, SocksdError};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address on which nothing listens
pub async fn closed_port_addr() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Spawn a TCP echo server that serves connections until the test ends
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if socket.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    addr
}

/// A server running in the background
pub struct TestServer {
    /// Address the SOCKS5 listener is bound to
    pub addr: SocketAddr,
    /// Send to stop the server
    pub shutdown_tx: broadcast::Sender<bool>,
    /// Resolves when the server has stopped
    pub handle: JoinHandle<Result<(), SocksdError>>,
}

impl TestServer {
    /// Connect a raw TCP client to the server
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }
}

/// Start a server with `config` on an ephemeral port
pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let (listener, addr) = create_test_listener().await;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let server = Server::new(config).unwrap();
    let handle = tokio::spawn(server.serve(listener, shutdown_rx));

    TestServer {
        addr,
        shutdown_tx,
        handle,
    }
}

/// Server configuration requiring the given users
pub fn password_config(users: &[(&str, &str)]) -> ServerConfig {
    ServerConfig {
        auth: AuthConfig {
            method: AuthMethod::Password,
            users: users
                .iter()
                .map(|(u, p)| (u.to_string(), p.to_string()))
                .collect(),
        },
        ..Default::default()
    }
}

/// Raw SOCKS5 handshake data
pub mod socks5_mock {
    use socksd::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a username/password sub-negotiation message
    pub fn create_user_pass(username: &str, password: &str) -> Vec<u8> {
        let mut msg = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        msg.extend_from_slice(username.as_bytes());
        msg.push(password.len() as u8);
        msg.extend_from_slice(password.as_bytes());
        msg
    }

    /// Create a command request to an IPv4 address
    pub fn create_command_ipv4(command: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![SOCKS5_VERSION, command, SOCKS5_RESERVED, SOCKS5_ADDR_TYPE_IPV4];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to an IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        create_command_ipv4(SOCKS5_CMD_TCP_CONNECT, ip, port)
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
