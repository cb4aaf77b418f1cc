use crate::collab::{MessageBuffer, MessageBufferManager};
use crate::mask::PreparedMaskKey;
use crate::opcode::Opcode;
use crate::utf8::Utf8Validator;

/// State accumulated while a single message (one opcode, possibly several
/// frames) is being reassembled. One instance exists for the in-flight data
/// message and one for the in-flight control message (spec.md §3). The
/// payload itself lives in a `MessageBuffer` obtained from the host's
/// `MessageBufferManager` (spec.md §6) rather than a bare `Vec<u8>`, so the
/// host's allocation policy is honored from the first frame.
pub struct MessageMetadata {
    pub buffer: Box<dyn MessageBuffer + Send>,
    pub mask: Option<PreparedMaskKey>,
    pub utf8: Utf8Validator,
}

impl std::fmt::Debug for MessageMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageMetadata")
            .field("opcode", &self.buffer.opcode())
            .field("payload_len", &self.buffer.payload().len())
            .field("mask", &self.mask)
            .finish()
    }
}

impl MessageMetadata {
    pub fn new(
        manager: &dyn MessageBufferManager,
        opcode: Opcode,
        size_hint: usize,
        compressed: bool,
    ) -> Self {
        let mut buffer = manager.get_message(opcode, size_hint);
        buffer.set_compressed(compressed);
        MessageMetadata {
            buffer,
            mask: None,
            utf8: Utf8Validator::new(),
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.buffer.opcode()
    }

    pub fn is_compressed(&self) -> bool {
        self.buffer.compressed()
    }
}

/// Which of the processor's two metadata slots is currently being filled.
/// A tagged sum type instead of a raw back-pointer (spec.md §9), so illegal
/// states — pointing at neither slot, or at both — are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentFrame {
    Data,
    Control,
}

/// The two-slot arena: at most one in-flight data message and one in-flight
/// control message at a time, indexed by `CurrentFrame` rather than pointer
/// chasing.
#[derive(Default)]
pub struct MessageArena {
    data: Option<MessageMetadata>,
    control: Option<MessageMetadata>,
}

impl MessageArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, which: CurrentFrame) -> &Option<MessageMetadata> {
        match which {
            CurrentFrame::Data => &self.data,
            CurrentFrame::Control => &self.control,
        }
    }

    pub fn slot_mut(&mut self, which: CurrentFrame) -> &mut Option<MessageMetadata> {
        match which {
            CurrentFrame::Data => &mut self.data,
            CurrentFrame::Control => &mut self.control,
        }
    }

    pub fn take(&mut self, which: CurrentFrame) -> Option<MessageMetadata> {
        self.slot_mut(which).take()
    }
}
