//! The outbound frame builder (spec.md §4.7). Self-contained: each call
//! produces one prepared frame into the caller-supplied `MessageBuffer` and
//! retains no state across calls, apart from the RNG collaborator and the
//! (stateful, per-connection) compressor.

use crate::close::CloseCode;
use crate::collab::{MaskKeySource, MessageBuffer};
use crate::error::{WsError, WsErrorKind};
use crate::extensions::PermessageCompress;
use crate::header::prepare_header;
use crate::mask::mask_exact;
use crate::opcode::Opcode;
use crate::utf8::Utf8Validator;

/// The outbound half of one connection.
pub struct Builder {
    is_server: bool,
    compression_enabled: bool,
    mask_source: Box<dyn MaskKeySource + Send>,
    compressor: Box<dyn PermessageCompress + Send>,
}

impl Builder {
    pub fn new(
        is_server: bool,
        compression_enabled: bool,
        mask_source: Box<dyn MaskKeySource + Send>,
        compressor: Box<dyn PermessageCompress + Send>,
    ) -> Self {
        Builder {
            is_server,
            compression_enabled,
            mask_source,
            compressor,
        }
    }

    fn next_mask_key(&mut self) -> [u8; 4] {
        self.mask_source.next_mask_key().to_be_bytes()
    }

    /// `prepare_data_frame` (spec.md §4.7): build a `TEXT`/`BINARY`/
    /// `CONTINUATION` frame from `input` into `output`. `input.compressed()`
    /// is overloaded here as "the caller requests compression for this
    /// message", matching the `in.requests_compression` flag in spec.md's
    /// prose (the same accessor carries "was this compressed" on the inbound
    /// side and "should this be compressed" on the outbound side).
    pub fn prepare_data_frame(
        &mut self,
        input: &dyn MessageBuffer,
        output: &mut dyn MessageBuffer,
    ) -> Result<(), WsError> {
        let opcode = input.opcode();
        if opcode.is_control() {
            return Err(WsError::new(
                WsErrorKind::InvalidArguments,
                "prepare_data_frame does not accept control opcodes",
            ));
        }

        if opcode == Opcode::Text {
            let mut validator = Utf8Validator::new();
            if !validator.decode(input.payload()) || !validator.complete() {
                return Err(WsErrorKind::InvalidUtf8.into());
            }
        }

        let masked = !self.is_server;
        let compressed = self.compression_enabled && input.compressed();

        output.payload_mut().clear();

        let size = if compressed {
            self.compressor.compress(input.payload(), output.payload_mut())?;
            output.payload().len() as u64
        } else {
            output.payload_mut().resize(input.payload().len(), 0);
            input.payload().len() as u64
        };

        let header = if masked {
            let key = self.next_mask_key();
            if compressed {
                let plain = output.payload().to_vec();
                mask_exact(&plain, output.payload_mut(), key);
            } else {
                mask_exact(input.payload(), output.payload_mut(), key);
            }
            prepare_header(opcode, size, input.fin(), compressed, Some(key))
        } else {
            if !compressed {
                output.payload_mut().copy_from_slice(input.payload());
            }
            prepare_header(opcode, size, input.fin(), compressed, None)
        };

        output.set_header(header.to_vec());
        output.set_fin(input.fin());
        output.set_compressed(compressed);
        output.set_prepared(true);
        Ok(())
    }

    fn prepare_control_frame(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
        output: &mut dyn MessageBuffer,
    ) -> Result<(), WsError> {
        if !opcode.is_control() {
            return Err(WsError::new(
                WsErrorKind::InvalidArguments,
                "control-frame helper invoked with a non-control opcode",
            ));
        }
        if payload.len() > 125 {
            return Err(WsErrorKind::ControlTooBig.into());
        }

        let masked = !self.is_server;
        output.payload_mut().clear();
        output.payload_mut().resize(payload.len(), 0);

        let header = if masked {
            let key = self.next_mask_key();
            mask_exact(payload, output.payload_mut(), key);
            prepare_header(opcode, payload.len() as u64, true, false, Some(key))
        } else {
            output.payload_mut().copy_from_slice(payload);
            prepare_header(opcode, payload.len() as u64, true, false, None)
        };

        output.set_header(header.to_vec());
        output.set_fin(true);
        output.set_compressed(false);
        output.set_prepared(true);
        Ok(())
    }

    /// `prepare_ping` (spec.md §4.7).
    pub fn prepare_ping(&mut self, payload: &[u8], output: &mut dyn MessageBuffer) -> Result<(), WsError> {
        self.prepare_control_frame(Opcode::Ping, payload, output)
    }

    /// `prepare_pong` (spec.md §4.7).
    pub fn prepare_pong(&mut self, payload: &[u8], output: &mut dyn MessageBuffer) -> Result<(), WsError> {
        self.prepare_control_frame(Opcode::Pong, payload, output)
    }

    /// `prepare_close` (spec.md §4.7): big-endian code followed by the
    /// reason, or an empty payload for `NoStatus`.
    pub fn prepare_close(
        &mut self,
        code: CloseCode,
        reason: &str,
        output: &mut dyn MessageBuffer,
    ) -> Result<(), WsError> {
        code.validate_for_send()?;

        if matches!(code, CloseCode::NoStatus) && !reason.is_empty() {
            return Err(WsErrorKind::ReasonRequiresCode.into());
        }
        if reason.len() > 123 {
            return Err(WsErrorKind::ControlTooBig.into());
        }

        let mut payload = Vec::new();
        if let Some(code_value) = code.code() {
            payload.extend_from_slice(&code_value.to_be_bytes());
            payload.extend_from_slice(reason.as_bytes());
        }

        self.prepare_control_frame(Opcode::Close, &payload, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{FixedMaskSource, VecMessageBuffer};
    use crate::extensions::NullCompressor;
    use crate::header::{BasicHeader, ExtendedHeader};
    use crate::mask::mask_stream;
    use crate::mask::PreparedMaskKey;

    fn server_builder() -> Builder {
        Builder::new(
            true,
            true,
            Box::new(FixedMaskSource(0xdeadbeef)),
            Box::new(NullCompressor::new(false)),
        )
    }

    fn client_builder() -> Builder {
        Builder::new(
            false,
            true,
            Box::new(FixedMaskSource(0x11223344)),
            Box::new(NullCompressor::new(false)),
        )
    }

    fn decode_frame(bytes: &[u8]) -> (BasicHeader, Vec<u8>) {
        let basic = BasicHeader::parse([bytes[0], bytes[1]]);
        let extended_bytes = &bytes[2..basic.header_len()];
        let extended = ExtendedHeader::parse(&basic, extended_bytes).unwrap();
        let mut payload = bytes[basic.header_len()..].to_vec();
        if let Some(key) = extended.masking_key {
            mask_stream(&mut payload, PreparedMaskKey::new(key));
        }
        (basic, payload)
    }

    #[test]
    fn server_builds_unmasked_text_frame() {
        let mut builder = server_builder();
        let mut input = VecMessageBuffer::new(Opcode::Text, 16);
        input.payload_mut().extend_from_slice(b"hello");
        input.set_fin(true);

        let mut output = VecMessageBuffer::new(Opcode::Text, 16);
        builder.prepare_data_frame(&input, &mut output).unwrap();

        let mut full = output.header().to_vec();
        full.extend_from_slice(output.payload());
        let (basic, payload) = decode_frame(&full);
        assert!(!basic.masked);
        assert_eq!(payload, b"hello");
        assert!(output.prepared());
    }

    #[test]
    fn client_builds_masked_text_frame() {
        let mut builder = client_builder();
        let mut input = VecMessageBuffer::new(Opcode::Text, 16);
        input.payload_mut().extend_from_slice(b"hello");
        input.set_fin(true);

        let mut output = VecMessageBuffer::new(Opcode::Text, 16);
        builder.prepare_data_frame(&input, &mut output).unwrap();

        let mut full = output.header().to_vec();
        full.extend_from_slice(output.payload());
        let (basic, payload) = decode_frame(&full);
        assert!(basic.masked);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn prepare_data_frame_rejects_control_opcodes() {
        let mut builder = server_builder();
        let input = VecMessageBuffer::new(Opcode::Ping, 0);
        let mut output = VecMessageBuffer::new(Opcode::Ping, 0);
        assert_eq!(
            builder.prepare_data_frame(&input, &mut output).unwrap_err().kind(),
            WsErrorKind::InvalidArguments
        );
    }

    #[test]
    fn prepare_data_frame_rejects_invalid_utf8_text() {
        let mut builder = server_builder();
        let mut input = VecMessageBuffer::new(Opcode::Text, 4);
        input.payload_mut().extend_from_slice(&[0xff, 0xfe]);
        let mut output = VecMessageBuffer::new(Opcode::Text, 4);
        assert_eq!(
            builder.prepare_data_frame(&input, &mut output).unwrap_err().kind(),
            WsErrorKind::InvalidUtf8
        );
    }

    #[test]
    fn prepare_ping_and_pong_round_trip() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Ping, 0);
        builder.prepare_ping(b"hi", &mut output).unwrap();
        let mut full = output.header().to_vec();
        full.extend_from_slice(output.payload());
        let (basic, payload) = decode_frame(&full);
        assert_eq!(Opcode::try_from(basic.opcode_raw).unwrap(), Opcode::Ping);
        assert_eq!(payload, b"hi");
    }

    #[test]
    fn prepare_control_frame_rejects_oversized_payload() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Ping, 0);
        let payload = vec![0u8; 200];
        assert_eq!(
            builder.prepare_ping(&payload, &mut output).unwrap_err().kind(),
            WsErrorKind::ControlTooBig
        );
    }

    #[test]
    fn prepare_close_encodes_code_and_reason() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Close, 0);
        builder.prepare_close(CloseCode::Normal, "bye", &mut output).unwrap();
        let mut full = output.header().to_vec();
        full.extend_from_slice(output.payload());
        let (_, payload) = decode_frame(&full);
        assert_eq!(u16::from_be_bytes([payload[0], payload[1]]), 1000);
        assert_eq!(&payload[2..], b"bye");
    }

    #[test]
    fn prepare_close_no_status_with_reason_rejected() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Close, 0);
        assert_eq!(
            builder
                .prepare_close(CloseCode::NoStatus, "not empty", &mut output)
                .unwrap_err()
                .kind(),
            WsErrorKind::ReasonRequiresCode
        );
    }

    #[test]
    fn prepare_close_rejects_reserved_code() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Close, 0);
        assert_eq!(
            builder
                .prepare_close(CloseCode::Other(1005), "x", &mut output)
                .unwrap_err()
                .kind(),
            WsErrorKind::ReservedCloseCode
        );
    }

    #[test]
    fn prepare_close_no_status_empty_reason_is_valid() {
        let mut builder = server_builder();
        let mut output = VecMessageBuffer::new(Opcode::Close, 0);
        builder.prepare_close(CloseCode::NoStatus, "", &mut output).unwrap();
        assert!(output.payload().is_empty());
    }
}
