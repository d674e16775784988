//! BST-forest match finder
//!
//! This module implements the codec's dictionary: a hash-indexed forest of
//! binary search trees over a cyclic window of the last [`DICTIONARY_SIZE`]
//! input positions. Each input position is hashed on its first three bytes
//! into a 20-bit bucket; the bucket holds the root of a BST whose nodes are
//! earlier positions with the same hash, ordered by their suffixes.
//!
//! # Algorithm Overview
//!
//! Finding matches and maintaining the index are one operation. At every
//! position the finder:
//!
//! 1. Reads the bucket root and installs the current position as the new
//!    root.
//! 2. Descends the old tree comparing suffixes, re-attaching each visited
//!    node under the new root on the side its suffix belongs to.
//! 3. Records a candidate whenever a visited node's common prefix beats the
//!    longest seen so far, so the candidate list comes out sorted by length,
//!    strictly ascending.
//! 4. Tracks the confirmed prefix lengths of the descent's lower and upper
//!    bounds; the next comparison can start at their minimum instead of
//!    byte zero.
//!
//! The descent stops when it runs off the window, hits the attempt cap, or
//! finds a full-length match (in which case the visited node's children are
//! spliced directly under the new root and the node drops out).
//!
//! # Positions
//!
//! Tree nodes live in two flat `i32` arrays indexed by the cyclic position;
//! no owned pointers. Stored positions are relative to a moving base so
//! they stay in 32-bit range on arbitrarily long inputs: whenever the
//! relative position reaches [`REBASE_THRESHOLD`], every stored entry is
//! shifted down in bulk and entries that fall off the window are
//! invalidated.

use log::trace;

use crate::format::{
    DICTIONARY_SIZE, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, TAIL_LENGTH,
};
use crate::match_codec::Match;

/// Number of hash buckets; each bucket is the root of one BST
pub(crate) const HASH_TABLE_SIZE: usize = 1 << 20;

/// Two child slots per dictionary position
const CHILD_COUNT: usize = DICTIONARY_SIZE * 2;

/// Sentinel for "no node"
const INVALID_POSITION: i32 = -1;

/// Relative position at which the index is rebased. The largest multiple of
/// the dictionary size that keeps every stored position inside `i32` range.
pub(crate) const REBASE_THRESHOLD: usize =
    (i32::MAX as usize - DICTIONARY_SIZE + 1) / DICTIONARY_SIZE * DICTIONARY_SIZE;

/// FNV-1a over the three bytes at `pos`
#[inline]
fn hash(data: &[u8], pos: usize) -> u32 {
    const PRIME: u32 = 16777619;
    let mut result: u32 = 2166136261;

    result = (result ^ data[pos] as u32).wrapping_mul(PRIME);
    result = (result ^ data[pos + 1] as u32).wrapping_mul(PRIME);
    result = (result ^ data[pos + 2] as u32).wrapping_mul(PRIME);

    result
}

/// Cyclic dictionary over the input buffer.
///
/// The finder stores only the buffer length; the buffer itself is passed to
/// every [`find_matches`]/[`skip`] call and must be the same slice that was
/// installed with [`reset`]. The two index arrays are allocated on first use
/// and reused across resets.
///
/// [`find_matches`]: MatchFinder::find_matches
/// [`skip`]: MatchFinder::skip
/// [`reset`]: MatchFinder::reset
pub(crate) struct MatchFinder {
    buffer_len: usize,
    /// Highest position for which matches may be sought
    matchable_length: usize,
    /// Next input position to process
    absolute_position: usize,
    /// Origin of the relative positions stored in the index
    buffer_base: usize,
    rebase_threshold: usize,
    max_match_attempts: usize,

    /// Bucket -> BST root, as relative positions
    hash_table: Vec<i32>,
    /// Left/right child slots for every node, as relative positions
    children: Vec<i32>,
}

impl MatchFinder {
    pub fn new(max_match_attempts: usize) -> Self {
        Self {
            buffer_len: 0,
            matchable_length: 0,
            absolute_position: 0,
            buffer_base: 0,
            rebase_threshold: REBASE_THRESHOLD,
            max_match_attempts,
            hash_table: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Installs a new input buffer of `buffer_len` bytes and rewinds the
    /// matching window to the start.
    ///
    /// The index arrays are allocated lazily on the first reset; afterwards
    /// only the hash table is invalidated. Stale child entries are
    /// unreachable because every root is reset here and every node
    /// initializes its child slots when it is first inserted.
    pub fn reset(&mut self, buffer_len: usize) {
        self.buffer_len = buffer_len;
        self.absolute_position = 0;
        self.buffer_base = 0;

        // The last TAIL_LENGTH bytes are never matched into and a match
        // needs MIN_MATCH_LENGTH bytes to hash
        self.matchable_length = buffer_len.saturating_sub(TAIL_LENGTH + MIN_MATCH_LENGTH);

        if self.hash_table.is_empty() {
            self.hash_table = vec![INVALID_POSITION; HASH_TABLE_SIZE];
            self.children = vec![0; CHILD_COUNT];
        } else {
            self.hash_table.fill(INVALID_POSITION);
        }
    }

    /// Finds match candidates at the current position and slides the
    /// matching window one character forward.
    ///
    /// Candidates are stored in `candidates` ordered by length, strictly
    /// ascending, each at least [`MIN_MATCH_LENGTH`] long; the return value
    /// is their count. `candidates` must hold at least
    /// [`MAX_MATCH_CANDIDATE_COUNT`] entries.
    ///
    /// [`MAX_MATCH_CANDIDATE_COUNT`]: crate::format::MAX_MATCH_CANDIDATE_COUNT
    pub fn find_matches(&mut self, buffer: &[u8], candidates: &mut [Match]) -> usize {
        self.advance(buffer, Some(candidates))
    }

    /// Slides the matching window one character forward without reporting
    /// matches; the index is still updated.
    pub fn skip(&mut self, buffer: &[u8]) {
        self.advance(buffer, None);
    }

    /// The next input position to be processed
    pub fn position(&self) -> usize {
        self.absolute_position
    }

    fn advance(&mut self, buffer: &[u8], mut candidates: Option<&mut [Match]>) -> usize {
        debug_assert_eq!(buffer.len(), self.buffer_len);

        // Nothing can match this close to the end; just slide the window
        if self.absolute_position >= self.matchable_length {
            self.absolute_position += 1;
            return 0;
        }

        let max_match_length =
            (self.buffer_len - TAIL_LENGTH - self.absolute_position).min(MAX_MATCH_LENGTH);

        // All positions from here on are relative to buffer_base
        let position = self.relative_position();
        let min_match_position = position.saturating_sub(DICTIONARY_SIZE - 1);

        let bucket = (hash(buffer, self.buffer_base + position) as usize) % HASH_TABLE_SIZE;

        // The old root becomes the first match attempt; the current string
        // becomes the new root of this bucket's tree
        let mut match_position = self.hash_table[bucket];
        self.hash_table[bucket] = position as i32;

        let cyclic_input_position = position % DICTIONARY_SIZE;

        // Tails of the new root's left and right subtrees, filled in as the
        // descent re-attaches the old tree's nodes
        let mut left_subtree_leaf = cyclic_input_position * 2;
        let mut right_subtree_leaf = cyclic_input_position * 2 + 1;

        // Confirmed prefix lengths of the descent's lower and upper bounds;
        // anything between them shares at least min(low, high) bytes with
        // the current string
        let mut low_match_length = 0;
        let mut high_match_length = 0;

        let mut longest_match_length = 0;
        let mut match_count = 0;
        let mut candidate_count = 0;

        loop {
            if match_position < min_match_position as i32 || match_count == self.max_match_attempts
            {
                // All valid matches checked; terminate the new tree
                self.children[left_subtree_leaf] = INVALID_POSITION;
                self.children[right_subtree_leaf] = INVALID_POSITION;
                break;
            }

            match_count += 1;

            let match_pos = match_position as usize;
            let cyclic_match_position = match_pos % DICTIONARY_SIZE;

            let mut match_length = low_match_length.min(high_match_length);
            while match_length < max_match_length
                && buffer[self.buffer_base + position + match_length]
                    == buffer[self.buffer_base + match_pos + match_length]
            {
                match_length += 1;
            }

            if match_length > longest_match_length && match_length >= MIN_MATCH_LENGTH {
                longest_match_length = match_length;

                if let Some(out) = candidates.as_deref_mut() {
                    out[candidate_count] = Match {
                        length: match_length,
                        offset: position - match_pos,
                    };
                    candidate_count += 1;
                }

                if match_length == max_match_length {
                    // Full-length match: the visited node represents the
                    // same string, so splice its children under the new
                    // root and drop the node
                    self.children[left_subtree_leaf] = self.children[cyclic_match_position * 2];
                    self.children[right_subtree_leaf] =
                        self.children[cyclic_match_position * 2 + 1];
                    break;
                }
            }

            if buffer[self.buffer_base + position + match_length]
                < buffer[self.buffer_base + match_pos + match_length]
            {
                // The visited suffix is greater: it belongs in the new
                // root's right subtree, and the descent continues left
                self.children[right_subtree_leaf] = match_position;
                right_subtree_leaf = cyclic_match_position * 2;
                match_position = self.children[right_subtree_leaf];
                high_match_length = match_length;
            } else {
                self.children[left_subtree_leaf] = match_position;
                left_subtree_leaf = cyclic_match_position * 2 + 1;
                match_position = self.children[left_subtree_leaf];
                low_match_length = match_length;
            }
        }

        self.absolute_position += 1;

        candidate_count
    }

    /// Current position relative to `buffer_base`, rebasing the index first
    /// when the threshold is reached
    fn relative_position(&mut self) -> usize {
        let mut position = self.absolute_position - self.buffer_base;

        if position == self.rebase_threshold {
            let rebase_delta = self.rebase_threshold - DICTIONARY_SIZE;

            trace!(
                "rebasing dictionary at absolute position {} (delta {})",
                self.absolute_position,
                rebase_delta
            );

            self.buffer_base += rebase_delta;
            position -= rebase_delta;

            rebase_entries(&mut self.hash_table, rebase_delta as i32);
            rebase_entries(&mut self.children, rebase_delta as i32);
        }

        position
    }

    #[cfg(test)]
    pub(crate) fn set_rebase_threshold(&mut self, threshold: usize) {
        assert!(threshold >= 2 * DICTIONARY_SIZE && threshold % DICTIONARY_SIZE == 0);
        self.rebase_threshold = threshold;
    }
}

/// Shifts every stored position down by `delta`; positions that fall below
/// the new base have left the window and become invalid
fn rebase_entries(entries: &mut [i32], delta: i32) {
    for entry in entries.iter_mut() {
        *entry = if *entry >= delta {
            *entry - delta
        } else {
            INVALID_POSITION
        };
    }
}
