//! Incremental UTF-8 validation (spec.md §4.3) using Bjoern Hoehrmann's
//! byte-oriented DFA (a standard, widely reused public-domain construction —
//! <https://bjoern.hoehrmann.de/utf-8/decoder/dfa/>). The table-driven
//! approach processes one byte per transition and reports `ACCEPT`,
//! `REJECT`, or a partial-sequence state, which is exactly the shape the
//! processor needs to validate a `TEXT` message's payload across frame
//! boundaries without ever buffering the raw bytes twice.

const UTF8_ACCEPT: u8 = 0;
const UTF8_REJECT: u8 = 12;

#[rustfmt::skip]
const UTF8D: [u8; 364] = [
    // Byte -> character class (256 entries).
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1, 9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, 7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2, 2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8,
    // (state, character class) -> state (9 states * 12 classes = 108 entries).
    0,12,24,36,60,96,84,12,12,12,48,72,
    12,0,12,12,12,12,12,0,12,0,12,12,
    12,24,12,12,12,12,12,24,12,24,12,12,
    12,12,12,12,12,12,12,24,12,12,12,12,
    12,24,12,12,12,12,12,12,12,24,12,12,
    12,12,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,36,12,36,12,12,
    12,36,12,12,12,12,12,12,12,12,12,12,
];

/// Byte-fed incremental UTF-8 validator. `decode` may be called any number
/// of times with successive chunks of a byte stream; `complete` is only
/// true when the stream so far ends on a code-point boundary and no invalid
/// sequence has been seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Validator {
    state: u8,
    poisoned: bool,
}

impl Utf8Validator {
    pub fn new() -> Self {
        Self {
            state: UTF8_ACCEPT,
            poisoned: false,
        }
    }

    /// Feed `bytes` into the validator. Returns `false` as soon as an
    /// invalid sequence has been consumed; once that happens the validator
    /// is poisoned and every subsequent call also returns `false`.
    pub fn decode(&mut self, bytes: &[u8]) -> bool {
        if self.poisoned {
            return false;
        }
        for &byte in bytes {
            let class = UTF8D[byte as usize];
            self.state = UTF8D[256 + self.state as usize + class as usize];
            if self.state == UTF8_REJECT {
                self.poisoned = true;
                return false;
            }
        }
        true
    }

    /// `true` iff the validator is not mid-codepoint and has not seen an
    /// invalid sequence. Required to hold at `FIN` for `TEXT` messages.
    pub fn complete(&self) -> bool {
        !self.poisoned && self.state == UTF8_ACCEPT
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
