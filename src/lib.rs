//! hybi-core: an RFC 6455 (hybi-13) WebSocket protocol engine. Implements
//! the wire-level core only — the inbound byte-stream-to-message state
//! machine, the outbound message-to-frame builder, and the opening
//! handshake computation. Transport I/O, the event loop, the concrete
//! `permessage-deflate` codec, and the masking-key RNG are external
//! collaborators the host application supplies (see [`collab`] and
//! [`extensions`]).

pub mod builder;
pub mod close;
pub mod collab;
pub mod config;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod header;
pub mod mask;
pub mod message;
pub mod opcode;
pub mod processor;
pub mod protocol;
pub mod utf8;

pub mod demo;

pub use builder::Builder;
pub use close::CloseCode;
pub use collab::{MaskKeySource, MessageBuffer, MessageBufferManager};
pub use error::{Result, ServerError, ServerResult, WsError, WsErrorKind};
pub use extensions::{NullCompressor, PermessageCompress};
pub use handshake::{HandshakeRequest, HandshakeResponse};
pub use message::{CurrentFrame, MessageMetadata};
pub use opcode::Opcode;
pub use processor::{Processor, ProcessorState};
