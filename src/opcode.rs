use crate::error::{WsError, WsErrorKind};

/// WebSocket frame opcode (RFC 6455 §5.2). Reserved values (3-7, 11-15) are
/// rejected at the conversion boundary rather than silently remapped, so
/// callers can distinguish `invalid_opcode` from a legitimate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xa,
}

impl Opcode {
    /// Control frames are `>= 8`; data frames (including continuation) are `< 8`.
    pub fn is_control(self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }

    pub fn is_data(self) -> bool {
        !self.is_control()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = WsError;

    fn try_from(nibble: u8) -> Result<Self, Self::Error> {
        match nibble & 0x0f {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xa => Ok(Opcode::Pong),
            other => Err(WsError::new(
                WsErrorKind::InvalidOpcode,
                format!("reserved or undefined opcode {other:#x}"),
            )),
        }
    }
}
