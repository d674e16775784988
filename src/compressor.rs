//! Block compression engine
//!
//! The compressor walks the input one position at a time, asking the match
//! finder for candidates at the position *after* the token being emitted,
//! so a one-position look-ahead is always available for lazy evaluation.
//! Tokens are tagged literal/match through 32-bit control words whose slots
//! are reserved in the output ahead of time and filled in once complete;
//! the top bit of every control word is a guard that tells the decoder when
//! to refill.
//!
//! If at any point the output would outgrow the stored-mode size, the
//! partial encoding is abandoned and the block is rewritten as a verbatim
//! copy, so `compress` never produces more than
//! [`max_compressed_size`] bytes and never fails on incompressible data.

use log::debug;

use crate::config::CompressorConfig;
use crate::error::{Result, TreezipError};
use crate::format::{
    encode_header, header_size, max_compressed_size, Header, MAX_MATCH_CANDIDATE_COUNT,
    TRAILING_DUMMY_SIZE, VERSION, WORD_SIZE,
};
use crate::match_codec::{coded_match_size, encode_match, Match};
use crate::match_finder::MatchFinder;
use crate::wordio::fast_write;

/// Number of token bits in a control word; the remaining bit is the guard
const CONTROL_WORD_BIT_COUNT: usize = WORD_SIZE * 8 - 1;

/// Guard bit marking the end of a control word's bit list
const CONTROL_WORD_GUARD_BIT: u32 = 1 << CONTROL_WORD_BIT_COUNT;

/// Cumulative counters for a [`Compressor`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionStats {
    /// Blocks produced, stored blocks included
    pub blocks_compressed: u64,
    /// Blocks that fell back to stored mode
    pub stored_blocks: u64,
    /// Input bytes consumed
    pub bytes_in: u64,
    /// Output bytes produced, headers included
    pub bytes_out: u64,
    /// Literal tokens emitted
    pub literals_emitted: u64,
    /// Match tokens emitted
    pub matches_emitted: u64,
}

impl CompressionStats {
    /// Output bytes per input byte; lower is better, 0.0 before any block
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        self.bytes_out as f64 / self.bytes_in as f64
    }
}

/// Single-block compressor.
///
/// Owns the match finder's index arrays (about 20 MiB once allocated), so
/// an instance should be reused across blocks. Not reentrant: the index is
/// mutable scratch for the duration of each [`compress`] call.
///
/// [`compress`]: Compressor::compress
///
/// # Examples
///
/// ```
/// use treezip::{max_compressed_size, Compressor, Decompressor};
///
/// let input = b"the quick brown fox jumps over the lazy dog, \
///               the quick brown fox jumps over the lazy dog";
/// let mut compressed = vec![0u8; max_compressed_size(input.len())];
///
/// let mut compressor = Compressor::new();
/// let compressed_size = compressor.compress(input, &mut compressed)?;
///
/// let mut output = vec![0u8; input.len()];
/// Decompressor::new().decompress(&compressed[..compressed_size], &mut output)?;
/// assert_eq!(&output[..], &input[..]);
/// # Ok::<(), treezip::TreezipError>(())
/// ```
pub struct Compressor {
    match_finder: MatchFinder,
    config: CompressorConfig,
    stats: CompressionStats,
}

impl Compressor {
    /// Create a compressor with the default configuration
    pub fn new() -> Self {
        let config = CompressorConfig::default();
        Self {
            match_finder: MatchFinder::new(config.max_match_attempts),
            config,
            stats: CompressionStats::default(),
        }
    }

    /// Create a compressor with a custom configuration
    pub fn with_config(config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            match_finder: MatchFinder::new(config.max_match_attempts),
            config,
            stats: CompressionStats::default(),
        })
    }

    /// The active configuration
    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    /// Cumulative statistics over all blocks compressed by this instance
    pub fn stats(&self) -> &CompressionStats {
        &self.stats
    }

    /// Reset the statistics counters
    pub fn reset_stats(&mut self) {
        self.stats = CompressionStats::default();
    }

    /// Compresses a block of data into `destination` and returns the
    /// compressed size.
    ///
    /// `source` must be non-empty and `destination` must hold at least
    /// [`max_compressed_size`]`(source.len())` bytes, or the call fails
    /// with [`TreezipError::BufferTooSmall`]. Incompressible input is not
    /// an error; the block silently degrades to stored mode.
    pub fn compress(&mut self, source: &[u8], destination: &mut [u8]) -> Result<usize> {
        if source.is_empty() {
            return Err(TreezipError::buffer_too_small(1, 0));
        }

        let max_compressed_size = max_compressed_size(source.len());
        if destination.len() < max_compressed_size {
            return Err(TreezipError::buffer_too_small(
                max_compressed_size,
                destination.len(),
            ));
        }

        // The header is fixed-size for a given input length; leave room and
        // encode it last
        let mut output_iterator = header_size(max_compressed_size);

        self.match_finder.reset(source.len());

        let mut control_word = CONTROL_WORD_GUARD_BIT;
        let mut control_word_bit = 0;

        // Control word slots are reserved before their tokens so the
        // decoder always sees the word first
        let mut control_word_slot = output_iterator;
        output_iterator += WORD_SIZE;

        let mut literals_emitted = 0u64;
        let mut matches_emitted = 0u64;

        // The dictionary runs one position ahead of the emission cursor
        self.match_finder.skip(source);

        let mut candidates = [Match::NONE; MAX_MATCH_CANDIDATE_COUNT];
        let mut next_match = Match::NONE;

        while self.match_finder.position() - 1 < source.len() {
            // Each iteration may emit up to two words, and the stream ends
            // with the trailing dummy; stop early rather than overrun the
            // stored-mode size
            if output_iterator + 2 * WORD_SIZE + TRAILING_DUMMY_SIZE > max_compressed_size {
                debug!(
                    "output for {} input bytes reached {} bytes, storing instead",
                    source.len(),
                    output_iterator
                );
                let compressed_size = self.store(source, destination);
                self.record_block(source.len(), compressed_size, true, 0, 0);
                return Ok(compressed_size);
            }

            if control_word_bit == CONTROL_WORD_BIT_COUNT {
                fast_write(destination, control_word_slot, control_word, WORD_SIZE);

                control_word = CONTROL_WORD_GUARD_BIT;
                control_word_bit = 0;

                control_word_slot = output_iterator;
                output_iterator += WORD_SIZE;
            }

            // The current match is the previous look-ahead
            let mut current_match = next_match;

            let candidate_count = self.match_finder.find_matches(source, &mut candidates);
            next_match = self.best_match(&candidates[..candidate_count]);

            // Lazy evaluation: when the next position codes sufficiently
            // better per byte, demote the current match to a literal
            if self.config.lazy_matching
                && current_match.length > 0
                && (1 + next_match.length) * coded_match_size(current_match)
                    > current_match.length * (1 + coded_match_size(next_match))
            {
                current_match = Match::NONE;
            }

            if current_match.length == 0 {
                // Literal token: control bit stays 0, which also keeps
                // literal bits distinct from the guard bit
                let literal = source[self.match_finder.position() - 2];
                fast_write(destination, output_iterator, literal as u32, 1);
                output_iterator += 1;
                literals_emitted += 1;
            } else {
                control_word |= 1 << control_word_bit;

                output_iterator += encode_match(current_match, destination, output_iterator);
                matches_emitted += 1;

                // Slide the dictionary past the matched bytes, then restock
                // the look-ahead
                for _ in 0..current_match.length - 2 {
                    self.match_finder.skip(source);
                }
                let candidate_count = self.match_finder.find_matches(source, &mut candidates);
                next_match = self.best_match(&candidates[..candidate_count]);
            }

            control_word_bit += 1;
        }

        fast_write(destination, control_word_slot, control_word, WORD_SIZE);

        // Trailing slack lets the decoder read whole words without
        // per-byte checks
        fast_write(destination, output_iterator, 0, TRAILING_DUMMY_SIZE);
        output_iterator += TRAILING_DUMMY_SIZE;

        let compressed_size = output_iterator;

        let header = Header {
            uncompressed_size: source.len() as u64,
            compressed_size: compressed_size as u64,
            version: VERSION,
            is_stored: false,
        };
        encode_header(&header, max_compressed_size, destination);

        self.record_block(
            source.len(),
            compressed_size,
            false,
            literals_emitted,
            matches_emitted,
        );

        Ok(compressed_size)
    }

    /// Writes `source` verbatim after a stored-mode header
    fn store(&mut self, source: &[u8], destination: &mut [u8]) -> usize {
        let max_compressed_size = max_compressed_size(source.len());
        let header_size = header_size(max_compressed_size);
        let compressed_size = header_size + source.len();

        let header = Header {
            uncompressed_size: source.len() as u64,
            compressed_size: compressed_size as u64,
            version: VERSION,
            is_stored: true,
        };
        encode_header(&header, max_compressed_size, destination);

        destination[header_size..compressed_size].copy_from_slice(source);

        compressed_size
    }

    /// Selects the shortest candidate that codes in fewer bytes than it
    /// covers. Candidates arrive sorted by length ascending, so the first
    /// profitable one wins.
    fn best_match(&self, candidates: &[Match]) -> Match {
        for &candidate in candidates {
            if candidate.length > coded_match_size(candidate) {
                return candidate;
            }
        }
        Match::NONE
    }

    fn record_block(
        &mut self,
        input_size: usize,
        output_size: usize,
        stored: bool,
        literals: u64,
        matches: u64,
    ) {
        self.stats.blocks_compressed += 1;
        if stored {
            self.stats.stored_blocks += 1;
        }
        self.stats.bytes_in += input_size as u64;
        self.stats.bytes_out += output_size as u64;
        self.stats.literals_emitted += literals;
        self.stats.matches_emitted += matches;
    }

    #[cfg(test)]
    pub(crate) fn match_finder_mut(&mut self) -> &mut MatchFinder {
        &mut self.match_finder
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
