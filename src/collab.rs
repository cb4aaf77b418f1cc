//! External collaborator contracts (spec.md §6): the RNG used for masking
//! keys and the message-buffer allocation policy. Both are out of the
//! core's scope to *implement* — the core only depends on these traits —
//! but a usable default is provided so the crate is runnable out of the box.

use std::fmt;

use crate::opcode::Opcode;

/// Supplies masking keys. MUST produce a cryptographically unpredictable
/// value per masked frame — spec.md §9 is explicit that a predictable key
/// (e.g. stubbed to zero) defeats the defense masking provides against naive
/// intermediaries, so the default below is `rand`-backed and the zero-key
/// stub lives only behind `#[cfg(test)]`.
pub trait MaskKeySource: fmt::Debug {
    fn next_mask_key(&mut self) -> u32;
}

/// Default `MaskKeySource`, backed by `rand`'s thread-local CSPRNG.
#[derive(Debug, Default)]
pub struct ThreadRngMaskSource;

impl MaskKeySource for ThreadRngMaskSource {
    fn next_mask_key(&mut self) -> u32 {
        rand::random()
    }
}

#[cfg(test)]
#[derive(Debug)]
pub struct FixedMaskSource(pub u32);

#[cfg(test)]
impl MaskKeySource for FixedMaskSource {
    fn next_mask_key(&mut self) -> u32 {
        self.0
    }
}

/// Accessor contract for a message buffer, shared by the inbound processor
/// (accumulating a reassembled message) and the outbound builder (producing
/// a self-contained prepared frame). Names follow spec.md §6
/// (`get_opcode`, `get_fin`, `get_raw_payload`, `set_header`,
/// `set_prepared`, `get_compressed`) rendered in idiomatic Rust casing.
pub trait MessageBuffer: fmt::Debug {
    fn opcode(&self) -> Opcode;
    fn fin(&self) -> bool;
    fn set_fin(&mut self, fin: bool);
    fn payload(&self) -> &[u8];
    fn payload_mut(&mut self) -> &mut Vec<u8>;
    fn header(&self) -> &[u8];
    fn set_header(&mut self, header: Vec<u8>);
    fn prepared(&self) -> bool;
    fn set_prepared(&mut self, prepared: bool);
    fn compressed(&self) -> bool;
    fn set_compressed(&mut self, compressed: bool);
}

/// Allocates a `MessageBuffer` for a new message, given its opcode and an
/// estimated size. "Allocation policy" (pooling, arena reuse, pre-sizing) is
/// explicitly out of the core's scope; this trait is the seam a host
/// application hangs such a policy on.
pub trait MessageBufferManager: fmt::Debug {
    fn get_message(&self, opcode: Opcode, size_hint: usize) -> Box<dyn MessageBuffer + Send>;
}

/// Straightforward `Vec<u8>`-backed `MessageBuffer`.
#[derive(Debug)]
pub struct VecMessageBuffer {
    opcode: Opcode,
    fin: bool,
    payload: Vec<u8>,
    header: Vec<u8>,
    prepared: bool,
    compressed: bool,
}

impl VecMessageBuffer {
    pub fn new(opcode: Opcode, size_hint: usize) -> Self {
        VecMessageBuffer {
            opcode,
            fin: false,
            payload: Vec::with_capacity(size_hint.min(64 * 1024)),
            header: Vec::new(),
            prepared: false,
            compressed: false,
        }
    }
}

impl MessageBuffer for VecMessageBuffer {
    fn opcode(&self) -> Opcode {
        self.opcode
    }

    fn fin(&self) -> bool {
        self.fin
    }

    fn set_fin(&mut self, fin: bool) {
        self.fin = fin;
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn payload_mut(&mut self) -> &mut Vec<u8> {
        &mut self.payload
    }

    fn header(&self) -> &[u8] {
        &self.header
    }

    fn set_header(&mut self, header: Vec<u8>) {
        self.header = header;
    }

    fn prepared(&self) -> bool {
        self.prepared
    }

    fn set_prepared(&mut self, prepared: bool) {
        self.prepared = prepared;
    }

    fn compressed(&self) -> bool {
        self.compressed
    }

    fn set_compressed(&mut self, compressed: bool) {
        self.compressed = compressed;
    }
}

/// Default `MessageBufferManager`: a fresh `VecMessageBuffer` per call, no
/// pooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBufferManager;

impl MessageBufferManager for DefaultBufferManager {
    fn get_message(&self, opcode: Opcode, size_hint: usize) -> Box<dyn MessageBuffer + Send> {
        Box::new(VecMessageBuffer::new(opcode, size_hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_message_buffer_round_trips_fields() {
        let mut buf = VecMessageBuffer::new(Opcode::Text, 8);
        buf.payload_mut().extend_from_slice(b"hi");
        buf.set_fin(true);
        buf.set_header(vec![1, 2]);
        buf.set_prepared(true);
        buf.set_compressed(true);

        assert_eq!(buf.opcode(), Opcode::Text);
        assert_eq!(buf.payload(), b"hi");
        assert!(buf.fin());
        assert_eq!(buf.header(), &[1, 2]);
        assert!(buf.prepared());
        assert!(buf.compressed());
    }

    #[test]
    fn default_manager_allocates_fresh_buffers() {
        let manager = DefaultBufferManager;
        let a = manager.get_message(Opcode::Binary, 4);
        let b = manager.get_message(Opcode::Binary, 4);
        assert_eq!(a.opcode(), Opcode::Binary);
        assert_eq!(b.opcode(), Opcode::Binary);
    }
}
