//! The masking engine (spec.md §4.2). A masking key is rotated so that the
//! XOR applied to byte `i` of a message always equals `raw_key[i mod 4]`,
//! regardless of how the bytes are batched into calls — the rotation lives
//! in `PreparedMaskKey`, not in the caller.

/// A masking key transformed into rotated, word-ready form. Carries the
/// phase (0-3) reached so far within the 4-byte cycle, so that masking the
/// same frame's payload across several buffer boundaries produces identical
/// output to masking it all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedMaskKey {
    raw: [u8; 4],
    phase: u8,
}

impl PreparedMaskKey {
    /// Convert an on-the-wire masking key into prepared form at the start of
    /// a frame (phase 0).
    pub fn new(raw_key: [u8; 4]) -> Self {
        PreparedMaskKey { raw: raw_key, phase: 0 }
    }

    fn rotated_bytes(self) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.raw[(self.phase as usize + i) % 4];
        }
        out
    }

    fn advance(self, len: usize) -> Self {
        PreparedMaskKey {
            raw: self.raw,
            phase: ((self.phase as usize + len) % 4) as u8,
        }
    }
}

#[cfg(not(feature = "strict_masking"))]
fn mask_in_place(buf: &mut [u8], rotated: [u8; 4]) {
    let word = u32::from_ne_bytes(rotated);
    let mut chunks = buf.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(chunk);
        let masked = u32::from_ne_bytes(arr) ^ word;
        chunk.copy_from_slice(&masked.to_ne_bytes());
    }
    let remainder = chunks.into_remainder();
    for (byte, key_byte) in remainder.iter_mut().zip(rotated.iter()) {
        *byte ^= key_byte;
    }
}

#[cfg(feature = "strict_masking")]
fn mask_in_place(buf: &mut [u8], rotated: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= rotated[i % 4];
    }
}

/// Apply the mask to `buf` in place, rotating the key by `buf.len() mod 4`.
/// Returns the prepared key to pass to the next call continuing the same
/// frame's payload.
pub fn mask_stream(buf: &mut [u8], key: PreparedMaskKey) -> PreparedMaskKey {
    mask_in_place(buf, key.rotated_bytes());
    key.advance(buf.len())
}

/// Mask `len` bytes from `src` into `dst` (both contiguous), used by the
/// outbound builder when the whole payload is already buffered. Always
/// starts at phase 0, since the builder is producing a fresh frame.
pub fn mask_exact(src: &[u8], dst: &mut [u8], key: [u8; 4]) {
    debug_assert_eq!(src.len(), dst.len());
    dst.copy_from_slice(src);
    mask_stream(dst, PreparedMaskKey::new(key));
}
