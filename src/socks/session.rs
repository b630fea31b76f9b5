//! SOCKS5 session state machine
//!
//! Drives one client connection through the protocol phases:
//! negotiation, authentication, request parsing, dispatch and relay.
//! Each phase either hands over to the next or ends the session.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::auth::select_auth_method;
use crate::socks::consts::*;
use crate::socks::proto::{NegotiationReply, NegotiationRequest, Request, RequestReply};
use crate::socks::tcp_relay::handle_tcp_connect;
use crate::socks::types::SocksCommand;
use crate::socks::Socks5Service;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Commands this server executes. Everything else is answered with
/// "command not supported".
const SUPPORTED_COMMANDS: &[SocksCommand] = &[SocksCommand::Connect];

/// Handle SOCKS5 protocol on a stream
///
/// # Protocol Flow
///
/// 1. Method negotiation; no acceptable method ends the session quietly
/// 2. Authentication with the configured authenticator
/// 3. Request parsing and validation
/// 4. Command dispatch (CONNECT only)
/// 5. Relay until either side closes
///
/// # Returns
///
/// `Ok(())` when the session ended normally: relay finished, or the client
/// offered no acceptable method. Any protocol, authentication or dial
/// failure is returned as an error after whatever reply the phase owes the
/// client has been written.
pub async fn handle_socks5_on_stream<S>(
    mut stream: S,
    service: &Socks5Service,
) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let authenticator = service.authenticator();

    // Negotiating
    let negotiation = NegotiationRequest::read_from(&mut stream).await?;
    if negotiation.version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(negotiation.version));
    }

    let method = select_auth_method(&negotiation.methods, authenticator.method());
    NegotiationReply::new(method).write_to(&mut stream).await?;
    debug!("Negotiation reply sent with method: {:#04x}", method);

    if method == SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE {
        debug!("No acceptable authentication method, closing connection");
        return Ok(());
    }

    // Authenticating
    authenticator.authenticate(&mut stream).await?;
    debug!("Authentication completed with method: {:?}", authenticator.kind());

    // Parsing request
    let request = Request::read_from(&mut stream).await?;
    if request.version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(request.version));
    }

    let command = match request
        .command()
        .filter(|command| SUPPORTED_COMMANDS.contains(command))
    {
        Some(command) => command,
        None => {
            reply_command_not_supported(&mut stream, request.addr_type).await?;
            return Err(Socks5Error::CommandNotSupported(request.command));
        }
    };

    let target_addr = match request.target_addr() {
        Ok(addr) => addr,
        Err(e @ Socks5Error::AddressTypeNotSupported(_)) => {
            reply_command_not_supported(&mut stream, request.addr_type).await?;
            return Err(e);
        }
        Err(e @ Socks5Error::InvalidDomain(_)) => {
            // A name that is not UTF-8 cannot be resolved
            RequestReply::failure(Socks5ReplyCode::HostUnreachable, request.addr_type)
                .write_to(&mut stream)
                .await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    info!("SOCKS5 {} request to {}", command, target_addr);

    // Dispatching
    match command {
        SocksCommand::Connect => {
            handle_tcp_connect(stream, request.addr_type, target_addr, service).await
        }
        SocksCommand::Bind | SocksCommand::UdpAssociate => {
            reply_command_not_supported(&mut stream, request.addr_type).await?;
            Err(Socks5Error::CommandNotSupported(command.to_byte()))
        }
    }
}

async fn reply_command_not_supported<S>(stream: &mut S, addr_type: u8) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    RequestReply::failure(Socks5ReplyCode::CommandNotSupported, addr_type)
        .write_to(stream)
        .await?;
    Ok(())
}
