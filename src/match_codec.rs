//! Match encoding and decoding
//!
//! A match is a (length, offset) reference into the previously decoded
//! output. Matches are coded in 1-4 bytes with a prefix tag in the low bits,
//! the smallest encoding that fits winning:
//!
//! | Condition                  | Bytes | Layout (LSB first)                     |
//! |----------------------------|-------|----------------------------------------|
//! | len code 0, offset < 64    | 1     | tag `00`, 6-bit offset                 |
//! | len code 0, offset < 16384 | 2     | tag `01`, 14-bit offset                |
//! | len code < 16, offset < 1024 | 2   | tag `10`, 4-bit length, 10-bit offset  |
//! | len code < 32, offset < 65536 | 3  | tag `011`, 5-bit length, 16-bit offset |
//! | otherwise                  | 4     | tag `111`, 8-bit length, 21-bit offset |
//!
//! where the length code is `length - MIN_MATCH_LENGTH`. The decoder indexes
//! an 8-entry lookup table with the low 3 bits of the first byte; the two
//! rows whose top bit is set alias the shorter codes.

use crate::format::{MIN_MATCH_LENGTH, WORD_SIZE};
use crate::wordio::{fast_read, fast_write};

/// A back-reference into previously seen data.
///
/// `length == 0` means "no match"; real matches satisfy
/// `MIN_MATCH_LENGTH <= length <= MAX_MATCH_LENGTH` and `offset >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub length: usize,
    pub offset: usize,
}

impl Match {
    /// The "no match" sentinel
    pub const NONE: Match = Match { length: 0, offset: 0 };
}

/// One row of the match decoding table
struct MatchLookup {
    /// Mask for the entire encoded match
    mask: u32,
    offset_shift: u8,
    length_mask: u8,
    length_shift: u8,
    /// Size of the encoded match in bytes
    size: u8,
}

/// Decoding table indexed by the low 3 bits of the first encoded byte
#[rustfmt::skip]
const MATCH_LOOKUP: [MatchLookup; 8] = [
    MatchLookup { mask: 0xff,        offset_shift: 2,  length_mask: 0,   length_shift: 0, size: 1 }, // (0)00
    MatchLookup { mask: 0xffff,      offset_shift: 2,  length_mask: 0,   length_shift: 0, size: 2 }, // (0)01
    MatchLookup { mask: 0xffff,      offset_shift: 6,  length_mask: 15,  length_shift: 2, size: 2 }, // (0)10
    MatchLookup { mask: 0xffffff,    offset_shift: 8,  length_mask: 31,  length_shift: 3, size: 3 }, // (0)11
    MatchLookup { mask: 0xff,        offset_shift: 2,  length_mask: 0,   length_shift: 0, size: 1 }, // (1)00 = (0)00
    MatchLookup { mask: 0xffff,      offset_shift: 2,  length_mask: 0,   length_shift: 0, size: 2 }, // (1)01 = (0)01
    MatchLookup { mask: 0xffff,      offset_shift: 6,  length_mask: 15,  length_shift: 2, size: 2 }, // (1)10 = (0)10
    MatchLookup { mask: 0xffffffff, offset_shift: 11, length_mask: 255, length_shift: 3, size: 4 }, // 111
];

/// Packs a match into its coded word and byte size.
///
/// The length code is computed with wrapping subtraction so that the "no
/// match" sentinel falls through to the widest encoding; its 4-byte cost is
/// what the lazy-evaluation heuristic expects.
fn pack_match(m: Match) -> (u32, usize) {
    let length_code = (m.length as u32).wrapping_sub(MIN_MATCH_LENGTH as u32);
    let offset_code = m.offset as u32;

    if length_code == 0 && offset_code < 64 {
        (offset_code << 2, 1) // 00
    } else if length_code == 0 && offset_code < 16384 {
        ((offset_code << 2) | 1, 2) // 01
    } else if length_code < 16 && offset_code < 1024 {
        ((offset_code << 6) | (length_code << 2) | 2, 2) // 10
    } else if length_code < 32 && offset_code < 65536 {
        ((offset_code << 8) | (length_code << 3) | 3, 3) // 011
    } else {
        ((offset_code << 11) | (length_code << 3) | 7, 4) // 111
    }
}

/// Encodes `m` at `offset` in `destination` and returns the coded size.
///
/// May write a full 4-byte word regardless of the coded size; the caller
/// guarantees the slack.
pub(crate) fn encode_match(m: Match, destination: &mut [u8], offset: usize) -> usize {
    let (word, size) = pack_match(m);
    fast_write(destination, offset, word, size);
    size
}

/// Returns the number of bytes `m` would occupy when encoded
pub(crate) fn coded_match_size(m: Match) -> usize {
    pack_match(m).1
}

/// Decodes a match at `offset` in `source` and returns it with its coded
/// size.
///
/// Always reads a full 4-byte word; the caller guarantees the slack.
pub(crate) fn decode_match(source: &[u8], offset: usize) -> (Match, usize) {
    let word = fast_read(source, offset, WORD_SIZE);
    let entry = &MATCH_LOOKUP[(word & 7) as usize];

    let m = Match {
        offset: ((word & entry.mask) >> entry.offset_shift) as usize,
        length: (((word >> entry.length_shift) & entry.length_mask as u32) as usize)
            + MIN_MATCH_LENGTH,
    };

    (m, entry.size as usize)
}
