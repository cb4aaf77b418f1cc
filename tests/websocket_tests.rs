use hybi_core::close::CloseCode;
use hybi_core::collab::{DefaultBufferManager, MessageBuffer, ThreadRngMaskSource, VecMessageBuffer};
use hybi_core::error::WsErrorKind;
use hybi_core::extensions::{negotiate_extensions, NullCompressor};
use hybi_core::handshake::{accept_key, process_handshake, validate_handshake, HandshakeResponse};
use hybi_core::message::CurrentFrame;
use hybi_core::opcode::Opcode;
use hybi_core::processor::Processor;
use hybi_core::protocol::request::HttpRequest;
use hybi_core::protocol::response::HttpResponse;
use hybi_core::Builder;

const WEBSOCKET_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\nHost: example.com\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n";

#[test]
fn accept_key_matches_rfc_6455_test_vector() {
    assert_eq!(
        accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
        "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
}

#[test]
fn full_handshake_round_trip_via_http_types() {
    let request = HttpRequest::from_buffer(WEBSOCKET_REQUEST).unwrap();
    validate_handshake(&request).unwrap();

    let mut response = HttpResponse::switching_protocols();
    process_handshake(&request, &mut response).unwrap();

    let raw_response = String::from_utf8(response.raw()).unwrap();
    assert!(raw_response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(raw_response.contains("sec-websocket-accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
    assert!(raw_response.contains("upgrade: websocket"));
    assert!(raw_response.contains("connection: Upgrade"));
    // Exactly one Connection line — no contradictory trailing `connection: close`.
    assert_eq!(raw_response.matches("onnection:").count(), 1);
}

fn server_processor() -> Processor {
    Processor::new(
        true,
        false,
        1 << 20,
        Box::new(DefaultBufferManager),
        Box::new(NullCompressor::new(false)),
    )
}

fn client_builder() -> Builder {
    Builder::new(
        false,
        false,
        Box::new(ThreadRngMaskSource),
        Box::new(NullCompressor::new(false)),
    )
}

/// A client-side `Builder` frame fed straight into a server-side `Processor`
/// should reassemble to exactly the bytes the builder was given — the two
/// halves of the core agree on the wire format without a real socket between
/// them.
#[test]
fn builder_output_reassembles_through_processor_single_frame() {
    let mut builder = client_builder();

    let mut input = VecMessageBuffer::new(Opcode::Text, 5);
    input.payload_mut().extend_from_slice(b"hello");
    input.set_fin(true);

    let mut frame = VecMessageBuffer::new(Opcode::Text, 0);
    builder.prepare_data_frame(&input, &mut frame).unwrap();

    let mut wire = Vec::new();
    wire.extend_from_slice(frame.header());
    wire.extend_from_slice(frame.payload());

    let mut processor = server_processor();
    let (consumed, result) = processor.consume(&wire);
    result.unwrap();
    assert_eq!(consumed, wire.len());
    assert_eq!(processor.ready_kind(), Some(CurrentFrame::Data));

    let (which, metadata) = processor.take_message().unwrap();
    assert_eq!(which, CurrentFrame::Data);
    assert_eq!(metadata.opcode(), Opcode::Text);
    assert_eq!(metadata.buffer.payload(), b"hello");
}

/// Two builder-produced frames — an unfinished `TEXT` frame followed by a
/// `CONTINUATION` frame carrying the rest — reassemble into one message when
/// fed to the processor back to back, mirroring how a real peer would split
/// a large message across frames.
#[test]
fn builder_output_reassembles_through_processor_fragmented() {
    let mut builder = client_builder();

    let mut first = VecMessageBuffer::new(Opcode::Text, 5);
    first.payload_mut().extend_from_slice(b"Hello");
    first.set_fin(false);
    let mut frame1 = VecMessageBuffer::new(Opcode::Text, 0);
    builder.prepare_data_frame(&first, &mut frame1).unwrap();

    let mut second = VecMessageBuffer::new(Opcode::Continuation, 7);
    second.payload_mut().extend_from_slice(b", world");
    second.set_fin(true);
    let mut frame2 = VecMessageBuffer::new(Opcode::Continuation, 0);
    builder.prepare_data_frame(&second, &mut frame2).unwrap();

    let mut wire = Vec::new();
    wire.extend_from_slice(frame1.header());
    wire.extend_from_slice(frame1.payload());
    wire.extend_from_slice(frame2.header());
    wire.extend_from_slice(frame2.payload());

    let mut processor = server_processor();
    let (consumed, result) = processor.consume(&wire);
    result.unwrap();
    assert_eq!(consumed, wire.len());

    let (_, metadata) = processor.take_message().unwrap();
    assert_eq!(metadata.opcode(), Opcode::Text);
    assert_eq!(metadata.buffer.payload(), b"Hello, world");
}

/// A `CLOSE` frame built with a status code and reason reassembles through
/// the processor with the big-endian code and reason bytes intact.
#[test]
fn builder_close_frame_reassembles_through_processor() {
    let mut builder = client_builder();

    let mut frame = VecMessageBuffer::new(Opcode::Close, 0);
    builder
        .prepare_close(CloseCode::Normal, "bye", &mut frame)
        .unwrap();

    let mut wire = Vec::new();
    wire.extend_from_slice(frame.header());
    wire.extend_from_slice(frame.payload());

    let mut processor = server_processor();
    let (consumed, result) = processor.consume(&wire);
    result.unwrap();
    assert_eq!(consumed, wire.len());
    assert_eq!(processor.ready_kind(), Some(CurrentFrame::Control));

    let (_, metadata) = processor.take_message().unwrap();
    assert_eq!(metadata.opcode(), Opcode::Close);
    let payload = metadata.buffer.payload();
    assert_eq!(&payload[..2], &1000u16.to_be_bytes());
    assert_eq!(&payload[2..], b"bye");
}

/// The exact raw frame from RFC 6455 §5.7's example: a masked single-frame
/// `TEXT` message carrying "Hello".
#[test]
fn rfc_example_single_frame_text_message() {
    let frame: [u8; 11] = [
        0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
    ];
    let mut processor = server_processor();
    let (consumed, result) = processor.consume(&frame);
    result.unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(processor.ready_kind(), Some(CurrentFrame::Data));

    let (which, metadata) = processor.take_message().unwrap();
    assert_eq!(which, CurrentFrame::Data);
    assert_eq!(metadata.opcode(), Opcode::Text);
    assert_eq!(metadata.buffer.payload(), b"Hello");
}

/// A `PING` whose basic header alone declares `payload-len-code = 126` is
/// rejected before the extended length bytes are even read.
#[test]
fn ping_with_extended_length_code_rejected_before_extended_bytes_read() {
    let mut processor = server_processor();
    // 0x89 = FIN|PING, 0xFE = MASK|126. No further bytes supplied.
    let (consumed, result) = processor.consume(&[0x89, 0xFE]);
    assert_eq!(consumed, 2);
    assert_eq!(result.unwrap_err().kind(), WsErrorKind::ControlTooBig);
}

#[test]
fn extensions_negotiation_short_circuits_when_disabled() {
    let mut compressor = NullCompressor::new(true);
    let err = negotiate_extensions(Some("permessage-compress"), false, &mut compressor).unwrap_err();
    assert_eq!(err.kind(), WsErrorKind::ExtensionsDisabled);
}

#[test]
fn extensions_negotiation_accepts_permessage_compress_when_enabled() {
    let mut compressor = NullCompressor::new(true);
    let accepted = negotiate_extensions(
        Some("permessage-compress; client_no_context_takeover"),
        true,
        &mut compressor,
    )
    .unwrap();
    assert_eq!(accepted, Some("permessage-compress".to_string()));
}
