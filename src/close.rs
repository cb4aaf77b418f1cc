use crate::error::{WsError, WsErrorKind};

/// A 16-bit close status, per RFC 6455 §7.4. `NoStatus` is the distinguished
/// "no code was present" state spec.md calls out — it never appears on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    GoingAway,
    ProtocolError,
    UnsupportedData,
    InvalidPayload,
    PolicyViolation,
    MessageTooBig,
    MandatoryExtension,
    InternalError,
    Other(u16),
    NoStatus,
}

impl CloseCode {
    pub fn code(self) -> Option<u16> {
        match self {
            CloseCode::Normal => Some(1000),
            CloseCode::GoingAway => Some(1001),
            CloseCode::ProtocolError => Some(1002),
            CloseCode::UnsupportedData => Some(1003),
            CloseCode::InvalidPayload => Some(1007),
            CloseCode::PolicyViolation => Some(1008),
            CloseCode::MessageTooBig => Some(1009),
            CloseCode::MandatoryExtension => Some(1010),
            CloseCode::InternalError => Some(1011),
            CloseCode::Other(code) => Some(code),
            CloseCode::NoStatus => None,
        }
    }

    /// Codes the RFC forbids from ever appearing on the wire: 1004-1006 and
    /// 1015 are reserved for internal/implementation use, never sent.
    fn is_reserved(code: u16) -> bool {
        matches!(code, 1004 | 1005 | 1006 | 1015)
    }

    /// `code` must be in `1000..=2999` (IANA-registered or reserved ranges)
    /// or `3000..=4999` (library/application use) to be well-formed.
    fn in_valid_range(code: u16) -> bool {
        (1000..=2999).contains(&code) || (3000..=4999).contains(&code)
    }

    /// Decode a close code received on the wire, rejecting reserved and
    /// out-of-range values per spec.md §3.
    pub fn from_wire(code: u16) -> Result<Self, WsError> {
        if Self::is_reserved(code) {
            return Err(WsErrorKind::ReservedCloseCode.into());
        }
        if !Self::in_valid_range(code) {
            return Err(WsErrorKind::InvalidCloseCode.into());
        }
        Ok(match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::InternalError,
            other => CloseCode::Other(other),
        })
    }

    /// Validate a code the *local* side wants to send. Unlike `from_wire`,
    /// `NoStatus` is a legal input here (it means "send an empty close
    /// frame").
    pub fn validate_for_send(self) -> Result<(), WsError> {
        match self.code() {
            None => Ok(()),
            Some(code) if Self::is_reserved(code) => Err(WsErrorKind::ReservedCloseCode.into()),
            Some(code) if !Self::in_valid_range(code) => {
                Err(WsErrorKind::InvalidCloseCode.into())
            }
            Some(_) => Ok(()),
        }
    }
}

impl From<u16> for CloseCode {
    /// Infallible conversion used by the builder for *sending*: callers pick
    /// named variants for well-known codes and `Other` for anything else;
    /// validity is checked separately by `validate_for_send`.
    fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            1011 => CloseCode::InternalError,
            other => CloseCode::Other(other),
        }
    }
}
