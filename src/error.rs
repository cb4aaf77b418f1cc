use thiserror::Error;

/// Every fallible core operation carries one of these kinds, matching the
/// taxonomy a caller needs to decide how to react: translate to an HTTP
/// status during the handshake, or pick a close code once the processor has
/// gone to `FATAL_ERROR`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsErrorKind {
    #[error("extensions are disabled for this connection")]
    ExtensionsDisabled,
    #[error("could not parse Sec-WebSocket-Extensions offer")]
    ExtensionParseError,
    #[error("handshake requires method GET")]
    InvalidHttpMethod,
    #[error("handshake requires HTTP/1.1")]
    InvalidHttpVersion,
    #[error("missing required handshake header")]
    MissingRequiredHeader,
    #[error("SHA-1 computation failed")]
    Sha1Library,
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("reserved or undefined opcode")]
    InvalidOpcode,
    #[error("invalid payload")]
    InvalidPayload,
    #[error("RSV bit set without a negotiated extension")]
    InvalidRsvBit,
    #[error("continuation frame out of sequence")]
    InvalidContinuation,
    #[error("control frame fragmented")]
    FragmentedControl,
    #[error("control frame payload exceeds 125 bytes")]
    ControlTooBig,
    #[error("server received an unmasked frame")]
    MaskingRequired,
    #[error("client received a masked frame")]
    MaskingForbidden,
    #[error("payload length not minimally encoded")]
    NonMinimalEncoding,
    #[error("payload length requires 64-bit range")]
    Requires64Bit,
    #[error("invalid UTF-8 in text message")]
    InvalidUtf8,
    #[error("reserved close code")]
    ReservedCloseCode,
    #[error("invalid close code")]
    InvalidCloseCode,
    #[error("close reason supplied without a close code")]
    ReasonRequiresCode,
    #[error("message exceeds configured size limit")]
    MessageTooBig,
    #[error("generic protocol error")]
    Generic,
}

/// A `WsErrorKind` paired with a human-readable detail, the unit every
/// fallible core operation returns on failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct WsError {
    pub kind: WsErrorKind,
    pub detail: String,
}

impl WsError {
    pub fn new(kind: WsErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> WsErrorKind {
        self.kind
    }
}

impl From<WsErrorKind> for WsError {
    fn from(kind: WsErrorKind) -> Self {
        WsError {
            detail: kind.to_string(),
            kind,
        }
    }
}

pub type Result<T> = std::result::Result<T, WsError>;

/// Errors surfaced by the ambient demo driver: transport I/O, HTTP parsing,
/// and core protocol errors wrapped together so `src/bin/ws_demo.rs` has a
/// single error type to propagate, the way the teacher's `ServerError` did.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid HTTP request: {0}")]
    InvalidHttpRequest(&'static str),

    #[error("WebSocket protocol error: {0}")]
    WebSocket(#[from] WsError),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;
