//! The inbound state machine (spec.md §4.6): turns a byte stream into
//! reassembled messages, one call to [`Processor::consume`] at a time. No
//! operation here blocks on I/O — `consume` is a pure function from
//! `(state, input bytes)` to `(new state, bytes consumed)`, leaving all
//! transport concerns to the caller (spec.md §5).

use crate::close::CloseCode;
use crate::collab::MessageBufferManager;
use crate::error::{WsError, WsErrorKind};
use crate::extensions::PermessageCompress;
use crate::header::{BasicHeader, ExtendedHeader};
use crate::mask::{mask_stream, PreparedMaskKey};
use crate::message::{CurrentFrame, MessageArena, MessageMetadata};
use crate::opcode::Opcode;

/// Processor states, exactly as named in spec.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    HeaderBasic,
    HeaderExtended,
    Extension,
    Application,
    Ready,
    FatalError,
}

/// The inbound half of one connection. One instance per connection; not
/// `Sync` — the caller is expected to drive it from a single task at a time
/// (spec.md §5).
pub struct Processor {
    is_server: bool,
    compression_enabled: bool,
    max_message_size: usize,
    buffer_manager: Box<dyn MessageBufferManager + Send>,
    compressor: Box<dyn PermessageCompress + Send>,

    state: ProcessorState,
    error: Option<WsError>,

    header_buf: [u8; 2],
    header_cursor: usize,

    extended_buf: [u8; 12],
    extended_cursor: usize,
    extended_len: usize,

    basic: Option<BasicHeader>,
    pending_opcode: Option<Opcode>,

    arena: MessageArena,
    current: Option<CurrentFrame>,
    current_fin: bool,
    bytes_needed: usize,
    ready_slot: Option<CurrentFrame>,
}

impl Processor {
    pub fn new(
        is_server: bool,
        compression_enabled: bool,
        max_message_size: usize,
        buffer_manager: Box<dyn MessageBufferManager + Send>,
        compressor: Box<dyn PermessageCompress + Send>,
    ) -> Self {
        Processor {
            is_server,
            compression_enabled,
            max_message_size,
            buffer_manager,
            compressor,
            state: ProcessorState::HeaderBasic,
            error: None,
            header_buf: [0; 2],
            header_cursor: 0,
            extended_buf: [0; 12],
            extended_cursor: 0,
            extended_len: 0,
            basic: None,
            pending_opcode: None,
            arena: MessageArena::new(),
            current: None,
            current_fin: false,
            bytes_needed: 0,
            ready_slot: None,
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn is_fatal(&self) -> bool {
        self.state == ProcessorState::FatalError
    }

    pub fn error(&self) -> Option<&WsError> {
        self.error.as_ref()
    }

    /// Which slot (if any) holds a fully reassembled message awaiting
    /// [`Processor::take_message`].
    pub fn ready_kind(&self) -> Option<CurrentFrame> {
        self.ready_slot
    }

    /// Transfer ownership of the completed message out of the processor,
    /// returning `state` to `HEADER_BASIC` (spec.md §4.6: "`READY`: stays
    /// until `get_message()` transfers ownership ... out").
    pub fn take_message(&mut self) -> Option<(CurrentFrame, MessageMetadata)> {
        let which = self.ready_slot.take()?;
        let metadata = self.arena.take(which);
        self.reset_header_state();
        self.state = ProcessorState::HeaderBasic;
        metadata.map(|m| (which, m))
    }

    fn reset_header_state(&mut self) {
        self.header_cursor = 0;
        self.extended_cursor = 0;
        self.extended_len = 0;
        self.basic = None;
        self.pending_opcode = None;
        self.current = None;
        self.current_fin = false;
        self.bytes_needed = 0;
    }

    fn fail(&mut self, err: WsError) -> WsError {
        self.state = ProcessorState::FatalError;
        self.error = Some(err.clone());
        err
    }

    /// Basic header validation (spec.md §4.6), given the current
    /// reassembly state for the continuation/`mid_message` rules.
    fn validate_basic_header(&self, basic: &BasicHeader) -> Result<Opcode, WsError> {
        let opcode = Opcode::try_from(basic.opcode_raw)?;

        if opcode.is_control() && basic.payload_len_code >= 126 {
            return Err(WsErrorKind::ControlTooBig.into());
        }
        if basic.rsv1 && (!self.compression_enabled || opcode.is_control()) {
            return Err(WsErrorKind::InvalidRsvBit.into());
        }
        if basic.rsv2 || basic.rsv3 {
            return Err(WsErrorKind::InvalidRsvBit.into());
        }
        if opcode.is_control() && !basic.fin {
            return Err(WsErrorKind::FragmentedControl.into());
        }
        if opcode.is_data() {
            let mid_message = self.arena.slot(CurrentFrame::Data).is_some();
            if !mid_message && opcode == Opcode::Continuation {
                return Err(WsErrorKind::InvalidContinuation.into());
            }
            if mid_message && opcode != Opcode::Continuation {
                return Err(WsErrorKind::InvalidContinuation.into());
            }
        }
        if self.is_server && !basic.masked {
            return Err(WsErrorKind::MaskingRequired.into());
        }
        if !self.is_server && basic.masked {
            return Err(WsErrorKind::MaskingForbidden.into());
        }
        Ok(opcode)
    }

    /// A received CLOSE frame's payload, if non-empty, leads with a 2-byte
    /// big-endian status code (spec.md §3); validate it against the
    /// reserved/out-of-range rule `CloseCode::from_wire` implements. A
    /// single dangling byte can't be a well-formed code either.
    fn validate_close_payload(payload: &[u8]) -> Result<(), WsError> {
        match payload.len() {
            0 => Ok(()),
            1 => Err(WsErrorKind::InvalidCloseCode.into()),
            _ => {
                let code = u16::from_be_bytes([payload[0], payload[1]]);
                CloseCode::from_wire(code).map(|_| ())
            }
        }
    }

    /// Extended header complete: validate length, locate or allocate the
    /// message metadata, initialize the per-frame prepared mask key, and
    /// move to `EXTENSION`.
    fn finish_extended_header(&mut self) -> Result<(), WsError> {
        let basic = self.basic.expect("basic header set before extended header completes");
        let extended = ExtendedHeader::parse(&basic, &self.extended_buf[..self.extended_len])?;
        let opcode = self
            .pending_opcode
            .expect("opcode computed during basic header validation");

        let which = if opcode.is_control() {
            CurrentFrame::Control
        } else {
            CurrentFrame::Data
        };

        let payload_len = usize::try_from(extended.payload_len)
            .map_err(|_| WsError::from(WsErrorKind::Requires64Bit))?;

        if self.arena.slot(which).is_none() {
            if payload_len > self.max_message_size {
                return Err(WsErrorKind::MessageTooBig.into());
            }
            let metadata = MessageMetadata::new(
                self.buffer_manager.as_ref(),
                opcode,
                payload_len,
                basic.rsv1,
            );
            *self.arena.slot_mut(which) = Some(metadata);
        } else {
            let existing_len = self.arena.slot(which).as_ref().unwrap().buffer.payload().len();
            if existing_len + payload_len > self.max_message_size {
                return Err(WsErrorKind::MessageTooBig.into());
            }
        }

        let metadata = self.arena.slot_mut(which).as_mut().unwrap();
        metadata.mask = extended.masking_key.map(PreparedMaskKey::new);

        self.current = Some(which);
        self.current_fin = basic.fin;
        self.bytes_needed = payload_len;
        self.state = ProcessorState::Extension;
        Ok(())
    }

    /// Feed `buf` into the state machine. Returns the number of bytes
    /// actually consumed; a processor error leaves the processor in
    /// `FATAL_ERROR` and is also returned.
    pub fn consume(&mut self, buf: &[u8]) -> (usize, Result<(), WsError>) {
        let mut consumed = 0;

        loop {
            if matches!(self.state, ProcessorState::Ready | ProcessorState::FatalError) {
                break;
            }

            let available = buf.len() - consumed;
            if available == 0 {
                let can_progress = match self.state {
                    ProcessorState::Application => self.bytes_needed == 0,
                    ProcessorState::HeaderExtended => self.extended_cursor == self.extended_len,
                    ProcessorState::Extension => true,
                    _ => false,
                };
                if !can_progress {
                    break;
                }
            }

            match self.state {
                ProcessorState::HeaderBasic => {
                    let need = 2 - self.header_cursor;
                    let take = need.min(available);
                    self.header_buf[self.header_cursor..self.header_cursor + take]
                        .copy_from_slice(&buf[consumed..consumed + take]);
                    self.header_cursor += take;
                    consumed += take;

                    if self.header_cursor < 2 {
                        break;
                    }

                    let basic = BasicHeader::parse(self.header_buf);
                    match self.validate_basic_header(&basic) {
                        Ok(opcode) => {
                            self.extended_len = basic.header_len() - 2;
                            self.extended_cursor = 0;
                            self.basic = Some(basic);
                            self.pending_opcode = Some(opcode);
                            self.state = ProcessorState::HeaderExtended;
                        }
                        Err(e) => return (consumed, Err(self.fail(e))),
                    }
                }

                ProcessorState::HeaderExtended => {
                    let need = self.extended_len - self.extended_cursor;
                    let take = need.min(available);
                    if take > 0 {
                        self.extended_buf[self.extended_cursor..self.extended_cursor + take]
                            .copy_from_slice(&buf[consumed..consumed + take]);
                        self.extended_cursor += take;
                        consumed += take;
                    }

                    if self.extended_cursor < self.extended_len {
                        break;
                    }

                    if let Err(e) = self.finish_extended_header() {
                        return (consumed, Err(self.fail(e)));
                    }
                }

                ProcessorState::Extension => {
                    // Reserved; currently a pure pass-through (spec.md §4.6).
                    self.state = ProcessorState::Application;
                }

                ProcessorState::Application => {
                    let take = self.bytes_needed.min(available);
                    if take == 0 && self.bytes_needed != 0 {
                        break;
                    }

                    let mut chunk = buf[consumed..consumed + take].to_vec();
                    consumed += take;

                    let which = self.current.expect("APPLICATION state implies a current slot");
                    {
                        let metadata = self
                            .arena
                            .slot_mut(which)
                            .as_mut()
                            .expect("metadata must exist in APPLICATION state");
                        if let Some(mask) = metadata.mask {
                            metadata.mask = Some(mask_stream(&mut chunk, mask));
                        }
                    }

                    let opcode = self.arena.slot(which).as_ref().unwrap().opcode();
                    let is_compressed = self.arena.slot(which).as_ref().unwrap().is_compressed();

                    let appended = if is_compressed {
                        let mut decompressed = Vec::new();
                        if let Err(e) = self.compressor.decompress(&chunk, &mut decompressed) {
                            return (consumed, Err(self.fail(e)));
                        }
                        self.arena
                            .slot_mut(which)
                            .as_mut()
                            .unwrap()
                            .buffer
                            .payload_mut()
                            .extend_from_slice(&decompressed);
                        decompressed
                    } else {
                        self.arena
                            .slot_mut(which)
                            .as_mut()
                            .unwrap()
                            .buffer
                            .payload_mut()
                            .extend_from_slice(&chunk);
                        chunk
                    };

                    if opcode == Opcode::Text {
                        let metadata = self.arena.slot_mut(which).as_mut().unwrap();
                        if !metadata.utf8.decode(&appended) {
                            return (consumed, Err(self.fail(WsErrorKind::InvalidUtf8.into())));
                        }
                    }

                    self.bytes_needed -= take;

                    if self.bytes_needed == 0 {
                        if self.current_fin {
                            let metadata = self.arena.slot_mut(which).as_mut().unwrap();
                            if opcode == Opcode::Text && !metadata.utf8.complete() {
                                return (consumed, Err(self.fail(WsErrorKind::InvalidUtf8.into())));
                            }
                            if opcode == Opcode::Close {
                                if let Err(e) = Self::validate_close_payload(metadata.buffer.payload()) {
                                    return (consumed, Err(self.fail(e)));
                                }
                            }
                            metadata.buffer.set_fin(true);
                            self.ready_slot = Some(which);
                            self.state = ProcessorState::Ready;
                        } else {
                            self.reset_header_state();
                            self.state = ProcessorState::HeaderBasic;
                        }
                    }
                }

                ProcessorState::Ready | ProcessorState::FatalError => unreachable!(),
            }
        }

        (consumed, Ok(()))
    }
}
