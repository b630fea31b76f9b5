//! TCP relay for SOCKS5 CONNECT command
//!
//! Handles TCP CONNECT requests by establishing a connection to the target
//! and relaying data bidirectionally.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::proto::RequestReply;
use crate::socks::types::TargetAddr;
use crate::socks::Socks5Service;
use crate::transport::connect_tcp;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Handle TCP CONNECT command
///
/// This function:
/// 1. Dials the target (domain names are resolved by the dial)
/// 2. On failure, replies with a code derived from the connect error and stops
/// 3. On success, replies with the upstream socket's local address
/// 4. Relays data bidirectionally between client and target
///
/// # Arguments
///
/// * `client_stream` - The client connection, handshake already done
/// * `request_addr_type` - ATYP of the request, used to shape failure replies
/// * `target_addr` - The target address to connect to
/// * `service` - Server-wide settings
pub async fn handle_tcp_connect<S>(
    mut client_stream: S,
    request_addr_type: u8,
    target_addr: TargetAddr,
    service: &Socks5Service,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    debug!("Connecting to target: {}", target_addr);

    let target_stream = match connect_tcp(&target_addr, service.connect_timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            let reply_code = Socks5ReplyCode::from(&e);
            debug!(
                "Failed to connect to {}: {} (reply {:?})",
                target_addr, e, reply_code
            );
            RequestReply::failure(reply_code, request_addr_type)
                .write_to(&mut client_stream)
                .await?;
            return Err(Socks5Error::ConnectFailed {
                target: target_addr.dial_target(),
                source: e,
            });
        }
    };
    service.socket_opts().hint(&target_stream);

    let local_addr = match target_stream.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            RequestReply::failure(Socks5ReplyCode::GeneralFailure, request_addr_type)
                .write_to(&mut client_stream)
                .await?;
            return Err(e.into());
        }
    };

    RequestReply::success(local_addr)
        .write_to(&mut client_stream)
        .await?;

    info!(
        "SOCKS5 tunnel established to {} via {}",
        target_addr, local_addr
    );

    relay_tcp(client_stream, target_stream).await;
    Ok(())
}

/// Relay data bidirectionally between two streams
///
/// Both directions are copied concurrently. The relay returns as soon as
/// either direction reaches EOF or fails; the other direction is dropped
/// and both streams are closed when they go out of scope.
pub async fn relay_tcp<A, B>(a: A, b: B)
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    let a_to_b = tokio::io::copy(&mut a_read, &mut b_write);
    let b_to_a = tokio::io::copy(&mut b_read, &mut a_write);

    tokio::select! {
        result = a_to_b => {
            match result {
                Ok(bytes) => debug!("Client->target finished: {} bytes", bytes),
                Err(e) => debug!("Client->target error: {}", e),
            }
        }
        result = b_to_a => {
            match result {
                Ok(bytes) => debug!("Target->client finished: {} bytes", bytes),
                Err(e) => debug!("Target->client error: {}", e),
            }
        }
    }
}
