//! One connection's lifecycle: buffer the handshake request, validate and
//! answer it, negotiate extensions, then drive the `Processor`/`Builder`
//! pair against the live socket until the peer closes. Generalized from the
//! teacher's `protocol::handle_connection` (handshake buffering) and
//! `websocket::handle_websocket` (the ping/pong `select!` loop).

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::interval;
use tracing::{info, warn};

use crate::builder::Builder;
use crate::close::CloseCode;
use crate::collab::{DefaultBufferManager, MessageBuffer, ThreadRngMaskSource, VecMessageBuffer};
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::extensions::{negotiate_extensions, NullCompressor};
use crate::handshake::{process_handshake, validate_handshake, HandshakeResponse};
use crate::message::CurrentFrame;
use crate::opcode::Opcode;
use crate::processor::Processor;
use crate::protocol::find_header_end;
use crate::protocol::request::HttpRequest;
use crate::protocol::response::HttpResponse;

/// Handshake requests larger than this never arrive in practice; treat a
/// buffer that grows past it without finding `\r\n\r\n` as malformed rather
/// than buffering forever.
const MAX_HANDSHAKE_BYTES: usize = 16 * 1024;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Drive one accepted connection end to end: perform the opening handshake,
/// then echo every data message back to the sender until the peer closes the
/// stream or sends a `CLOSE` frame.
pub async fn handle_connection(mut socket: TcpStream, config: &Config) -> ServerResult<()> {
    let peer_addr = socket.peer_addr().ok();
    info!(?peer_addr, "accepted connection");

    let mut buffer = BytesMut::with_capacity(4096);
    let header_end = match read_handshake_request(&mut socket, &mut buffer).await? {
        Some(end) => end,
        None => {
            info!(?peer_addr, "peer disconnected before completing the handshake");
            return Ok(());
        }
    };

    let request = HttpRequest::from_buffer(&buffer[..header_end])?;
    let trailing = buffer.split_off(header_end);

    validate_handshake(&request)?;

    let mut response = HttpResponse::switching_protocols();
    process_handshake(&request, &mut response)?;

    let negotiated = match negotiate_extensions(
        request.get_header("sec-websocket-extensions").map(String::as_str),
        config.extensions_enabled,
        &mut NullCompressor::new(config.extensions_enabled),
    ) {
        Ok(value) => value,
        Err(_) => None,
    };
    if let Some(value) = &negotiated {
        response.append_header("Sec-WebSocket-Extensions", value);
    }

    socket.write_all(&response.raw()).await?;
    info!(?peer_addr, compression = negotiated.is_some(), "handshake complete");

    let mut processor = Processor::new(
        true,
        negotiated.is_some(),
        config.max_message_size,
        Box::new(DefaultBufferManager),
        Box::new(NullCompressor::new(negotiated.is_some())),
    );
    let mut builder = Builder::new(
        true,
        negotiated.is_some(),
        Box::new(ThreadRngMaskSource),
        Box::new(NullCompressor::new(negotiated.is_some())),
    );

    if !trailing.is_empty() {
        if !feed(&mut processor, &mut builder, &mut socket, peer_addr, &trailing).await? {
            return Ok(());
        }
    }

    run_echo_loop(&mut processor, &mut builder, &mut socket, peer_addr).await
}

/// Read until the handshake request's header block is complete, or the peer
/// disconnects first (`Ok(None)`).
async fn read_handshake_request(
    socket: &mut TcpStream,
    buffer: &mut BytesMut,
) -> ServerResult<Option<usize>> {
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = find_header_end(buffer) {
            return Ok(Some(end));
        }
        if buffer.len() > MAX_HANDSHAKE_BYTES {
            return Err(ServerError::InvalidHttpRequest("handshake request too large"));
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

/// The post-handshake read/ping loop: reassemble incoming frames, echo data
/// messages, answer pings, and terminate on a peer `CLOSE` or a fatal
/// protocol error.
async fn run_echo_loop(
    processor: &mut Processor,
    builder: &mut Builder,
    socket: &mut TcpStream,
    peer_addr: Option<SocketAddr>,
) -> ServerResult<()> {
    let mut ping_timer = interval(PING_INTERVAL);
    ping_timer.tick().await; // first tick fires immediately; consume it up front
    let mut awaiting_pong = false;
    let mut read_buf = [0u8; 8192];

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                if awaiting_pong {
                    warn!(?peer_addr, "peer did not answer PING in time, closing");
                    return Ok(());
                }
                let mut out = VecMessageBuffer::new(Opcode::Ping, 0);
                builder.prepare_ping(&[], &mut out)?;
                write_prepared(socket, &out).await?;
                awaiting_pong = true;
            }
            read = socket.read(&mut read_buf) => {
                let n = read?;
                if n == 0 {
                    info!(?peer_addr, "connection closed by peer");
                    return Ok(());
                }
                let keep_going = feed(
                    processor,
                    builder,
                    socket,
                    peer_addr,
                    &read_buf[..n],
                ).await?;
                if !keep_going {
                    return Ok(());
                }
                awaiting_pong = false;
            }
        }
    }
}

/// Feed `bytes` into `processor`, draining and handling every message that
/// becomes ready along the way. Returns `false` once a `CLOSE` has been
/// answered and the connection should end.
async fn feed(
    processor: &mut Processor,
    builder: &mut Builder,
    socket: &mut TcpStream,
    peer_addr: Option<SocketAddr>,
    bytes: &[u8],
) -> ServerResult<bool> {
    let mut offset = 0;
    while offset < bytes.len() {
        let (consumed, result) = processor.consume(&bytes[offset..]);
        offset += consumed;

        if let Err(err) = result {
            warn!(?peer_addr, %err, "protocol error, closing connection");
            return Ok(false);
        }

        if !drain_ready_messages(processor, builder, socket, peer_addr).await? {
            return Ok(false);
        }

        if processor.is_fatal() {
            return Ok(false);
        }
        if consumed == 0 {
            break;
        }
    }
    Ok(true)
}

/// Drain every message currently sitting in `READY`. Returns `false` once a
/// `CLOSE` has been answered.
async fn drain_ready_messages(
    processor: &mut Processor,
    builder: &mut Builder,
    socket: &mut TcpStream,
    peer_addr: Option<SocketAddr>,
) -> ServerResult<bool> {
    while let Some(which) = processor.ready_kind() {
        let (_, metadata) = processor
            .take_message()
            .expect("ready_kind() just reported a message present");

        match which {
            CurrentFrame::Control => match metadata.opcode() {
                Opcode::Ping => {
                    info!(?peer_addr, "PING received, answering with PONG");
                    let mut out = VecMessageBuffer::new(Opcode::Pong, metadata.buffer.payload().len());
                    builder.prepare_pong(metadata.buffer.payload(), &mut out)?;
                    write_prepared(socket, &out).await?;
                }
                Opcode::Pong => {
                    info!(?peer_addr, "PONG received");
                }
                Opcode::Close => {
                    info!(?peer_addr, "CLOSE received, closing connection");
                    let mut out = VecMessageBuffer::new(Opcode::Close, 0);
                    builder.prepare_close(CloseCode::Normal, "", &mut out)?;
                    write_prepared(socket, &out).await?;
                    return Ok(false);
                }
                other => unreachable!("control slot cannot hold {other:?}"),
            },
            CurrentFrame::Data => {
                info!(
                    ?peer_addr,
                    opcode = ?metadata.opcode(),
                    len = metadata.buffer.payload().len(),
                    "echoing message"
                );
                let mut input = VecMessageBuffer::new(metadata.opcode(), metadata.buffer.payload().len());
                input.payload_mut().extend_from_slice(metadata.buffer.payload());
                input.set_fin(true);

                let mut out = VecMessageBuffer::new(metadata.opcode(), 0);
                builder.prepare_data_frame(&input, &mut out)?;
                write_prepared(socket, &out).await?;
            }
        }
    }
    Ok(true)
}

async fn write_prepared(socket: &mut TcpStream, buffer: &VecMessageBuffer) -> ServerResult<()> {
    socket.write_all(buffer.header()).await?;
    socket.write_all(buffer.payload()).await?;
    Ok(())
}
