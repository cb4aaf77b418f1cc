use bytes::{Buf, BufMut, BytesMut};

use crate::error::{WsError, WsErrorKind};
use crate::opcode::Opcode;

/// The fixed 2-byte header present on every frame (RFC 6455 §5.2). Bit
/// fields are decoded eagerly; *semantic* validity (is RSV1 permitted here,
/// is this opcode legal mid-message) is judged by the processor, not here —
/// the codec only knows about bits and lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode_raw: u8,
    pub masked: bool,
    pub payload_len_code: u8,
}

impl BasicHeader {
    /// Decode the two fixed header bytes. Opcode conversion is left to the
    /// caller (`Opcode::try_from`) since an invalid nibble is still a
    /// well-formed *header* byte, just a semantically invalid frame.
    pub fn parse(bytes: [u8; 2]) -> Self {
        let first = bytes[0];
        let second = bytes[1];
        BasicHeader {
            fin: first & 0x80 != 0,
            rsv1: first & 0x40 != 0,
            rsv2: first & 0x20 != 0,
            rsv3: first & 0x10 != 0,
            opcode_raw: first & 0x0f,
            masked: second & 0x80 != 0,
            payload_len_code: second & 0x7f,
        }
    }

    fn first_byte(&self) -> u8 {
        let mut b = self.opcode_raw & 0x0f;
        if self.fin {
            b |= 0x80;
        }
        if self.rsv1 {
            b |= 0x40;
        }
        if self.rsv2 {
            b |= 0x20;
        }
        if self.rsv3 {
            b |= 0x10;
        }
        b
    }

    /// Number of *extended header* bytes implied by `payload_len_code`
    /// (0, 2, or 8), not counting the masking key.
    pub fn extended_len_bytes(&self) -> usize {
        match self.payload_len_code {
            126 => 2,
            127 => 8,
            _ => 0,
        }
    }

    /// Total header length in `{2, 4, 6, 8, 10, 14}`, per spec.md §4.1.
    pub fn header_len(&self) -> usize {
        2 + self.extended_len_bytes() + if self.masked { 4 } else { 0 }
    }
}

/// The variable-length tail of the header: an optional extended payload
/// length and an optional masking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtendedHeader {
    pub payload_len: u64,
    pub masking_key: Option<[u8; 4]>,
}

impl ExtendedHeader {
    /// Decode the extended header bytes given the already-parsed basic
    /// header. `bytes` must be exactly `basic.header_len() - 2` long.
    ///
    /// Enforces minimal encoding (spec.md §3: code 126 implies length > 125;
    /// code 127 implies length > 65535) and that the 64-bit length's high
    /// bit is zero.
    pub fn parse(basic: &BasicHeader, bytes: &[u8]) -> Result<Self, WsError> {
        let mut buf = bytes;
        let payload_len = match basic.payload_len_code {
            126 => {
                let len = buf.get_u16() as u64;
                if len <= 125 {
                    return Err(WsErrorKind::NonMinimalEncoding.into());
                }
                len
            }
            127 => {
                let len = buf.get_u64();
                if len <= 0xffff {
                    return Err(WsErrorKind::NonMinimalEncoding.into());
                }
                if len & (1 << 63) != 0 {
                    return Err(WsErrorKind::Requires64Bit.into());
                }
                if usize::try_from(len).is_err() {
                    return Err(WsErrorKind::Requires64Bit.into());
                }
                len
            }
            small => small as u64,
        };

        let masking_key = if basic.masked {
            let mut key = [0u8; 4];
            buf.copy_to_slice(&mut key);
            Some(key)
        } else {
            None
        };

        Ok(ExtendedHeader {
            payload_len,
            masking_key,
        })
    }
}

/// Compute the minimally-encoded `(payload_len_code, extended_len_bytes)`
/// for a given payload size, used by the outbound builder.
pub fn minimal_length_code(len: u64) -> (u8, usize) {
    if len < 126 {
        (len as u8, 0)
    } else if len <= 0xffff {
        (126, 2)
    } else {
        (127, 8)
    }
}

/// Serialize a complete header (2-14 bytes) for transport, given the opcode,
/// payload length, `FIN`/`RSV1` flags, and an optional masking key.
#[allow(clippy::too_many_arguments)]
pub fn prepare_header(
    opcode: Opcode,
    len: u64,
    fin: bool,
    rsv1: bool,
    masking_key: Option<[u8; 4]>,
) -> BytesMut {
    let (len_code, extra) = minimal_length_code(len);
    let basic = BasicHeader {
        fin,
        rsv1,
        rsv2: false,
        rsv3: false,
        opcode_raw: opcode.as_u8(),
        masked: masking_key.is_some(),
        payload_len_code: len_code,
    };

    let mut out = BytesMut::with_capacity(2 + extra + 4);
    out.put_u8(basic.first_byte());
    out.put_u8((if basic.masked { 0x80 } else { 0 }) | basic.payload_len_code);
    match extra {
        2 => out.put_u16(len as u16),
        8 => out.put_u64(len),
        _ => {}
    }
    if let Some(key) = masking_key {
        out.put_slice(&key);
    }
    out
}
