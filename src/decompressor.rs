//! Block decompression engine
//!
//! The decoder is a single pass over the body, steered by the control
//! words. A control word is consumed LSB-first; because the encoder plants
//! a guard bit above the 31 token bits, the shifted-down word reading
//! exactly `1` means "refill", with no separate bit counter.
//!
//! Literals are copied in runs of up to four with whole-word reads and
//! writes, which may overshoot by up to three bytes; that is safe only
//! before the output tail, so the last [`TAIL_LENGTH`] bytes fall back to
//! byte-at-a-time copying. Match expansion likewise copies whole words,
//! displacing the source cursor for overlapping short offsets so the
//! word-sized chunks never overlap.
//!
//! [`TAIL_LENGTH`]: crate::format::TAIL_LENGTH

use crate::error::{Result, TreezipError};
use crate::format::{decode_header, TAIL_LENGTH, VERSION, WORD_SIZE};
use crate::match_codec::decode_match;
use crate::wordio::{fast_read, fast_write};

/// Number of trailing zero bits in the low nibble of a control word,
/// saturated at 4: the length of the next literal run
const LITERAL_RUN_LENGTH: [usize; 16] = [4, 0, 1, 0, 2, 0, 1, 0, 3, 0, 1, 0, 2, 0, 1, 0];

/// Size information extracted from a block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionInfo {
    /// Size of the original data in bytes
    pub uncompressed_size: u64,
    /// Total size of the block, header included
    pub compressed_size: u64,
    /// Encoding format version of the block
    pub version: u32,
}

/// Single-block decompressor.
///
/// Stateless apart from constant tables; an instance may be reused freely.
///
/// # Examples
///
/// ```
/// use treezip::{max_compressed_size, Compressor, Decompressor};
///
/// let input = b"to be or not to be, to be or not to be";
/// let mut block = vec![0u8; max_compressed_size(input.len())];
/// let size = Compressor::new().compress(input, &mut block)?;
///
/// let decompressor = Decompressor::new();
/// let info = decompressor.compression_info(&block[..size])?;
/// assert_eq!(info.uncompressed_size, input.len() as u64);
///
/// let mut output = vec![0u8; info.uncompressed_size as usize];
/// decompressor.decompress(&block[..size], &mut output)?;
/// assert_eq!(&output[..], &input[..]);
/// # Ok::<(), treezip::TreezipError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompressor;

impl Decompressor {
    /// Create a decompressor
    pub fn new() -> Self {
        Self
    }

    /// Decompresses a block into `destination`.
    ///
    /// `source` must hold the whole block and `destination` at least the
    /// header's uncompressed size. Any malformed input fails with one of
    /// the error variants; the contents of `destination` are unspecified
    /// after a failure.
    pub fn decompress(&self, source: &[u8], destination: &mut [u8]) -> Result<()> {
        let (header, header_size) = decode_header(source)?;

        if header.version != VERSION {
            return Err(TreezipError::unsupported_version(header.version));
        }

        if (source.len() as u64) < header.compressed_size {
            return Err(TreezipError::buffer_too_small(
                header.compressed_size as usize,
                source.len(),
            ));
        }
        if (destination.len() as u64) < header.uncompressed_size {
            return Err(TreezipError::buffer_too_small(
                header.uncompressed_size as usize,
                destination.len(),
            ));
        }

        let uncompressed_size = header.uncompressed_size as usize;
        let mut input_iterator = header_size;

        if header.is_stored {
            // Verbatim body; the header must not promise more than the
            // block actually carries
            if source.len() - header_size < uncompressed_size {
                return Err(TreezipError::corrupted_data(
                    "stored block shorter than its uncompressed size",
                ));
            }
            destination[..uncompressed_size]
                .copy_from_slice(&source[input_iterator..input_iterator + uncompressed_size]);
            return Ok(());
        }

        let input_end = header.compressed_size as usize;
        let output_end = uncompressed_size;

        // Fast word-sized writes are allowed only before the tail
        let output_tail = output_end.saturating_sub(TAIL_LENGTH);
        let mut output_iterator = 0usize;

        // 'Empty' sentinel: the first iteration always refills
        let mut control_word: u32 = 1;

        loop {
            // Decoding a token reads up to two words; well-formed input
            // always has that much left thanks to the trailing dummy
            if input_iterator + 2 * WORD_SIZE > input_end {
                return Err(TreezipError::corrupted_data(
                    "compressed body ran out of input",
                ));
            }

            if control_word == 1 {
                control_word = fast_read(source, input_iterator, WORD_SIZE);
                input_iterator += WORD_SIZE;
            }

            if control_word & 1 == 0 {
                if output_iterator < output_tail {
                    // Copy four literals regardless of the run length; the
                    // surplus is overwritten by the next token
                    fast_write(
                        destination,
                        output_iterator,
                        fast_read(source, input_iterator, WORD_SIZE),
                        WORD_SIZE,
                    );

                    let run_length = LITERAL_RUN_LENGTH[(control_word & 0xf) as usize];
                    input_iterator += run_length;
                    output_iterator += run_length;
                    control_word >>= run_length;
                } else {
                    // Inside the tail: output the remaining literals one
                    // byte at a time
                    while output_iterator < output_end {
                        if input_iterator + WORD_SIZE + 1 > input_end {
                            return Err(TreezipError::corrupted_data(
                                "compressed body ran out of input in the tail",
                            ));
                        }

                        if control_word == 1 {
                            control_word = fast_read(source, input_iterator, WORD_SIZE);
                            input_iterator += WORD_SIZE;
                        }

                        destination[output_iterator] = source[input_iterator];
                        output_iterator += 1;
                        input_iterator += 1;

                        control_word >>= 1;
                    }

                    return Ok(());
                }
            } else {
                let (m, match_size) = decode_match(source, input_iterator);
                input_iterator += match_size;

                let mut match_string = output_iterator as isize - m.offset as isize;

                // Matches never extend into the tail; anything else is a
                // forged offset or length
                if match_string < 0 || output_iterator + m.length > output_tail {
                    return Err(TreezipError::corrupted_data(
                        "match out of range in compressed body",
                    ));
                }

                let mut i = 0isize;

                if m.offset < WORD_SIZE {
                    // Overlapping short offset: copy three bytes one by
                    // one, then push the source cursor back so word-sized
                    // chunks no longer overlap
                    while i < 3 {
                        destination[(output_iterator as isize + i) as usize] =
                            destination[(match_string + i) as usize];
                        i += 1;
                    }
                    match_string -= 2 + (m.offset & 1) as isize;
                }

                loop {
                    let word = fast_read(destination, (match_string + i) as usize, WORD_SIZE);
                    fast_write(
                        destination,
                        (output_iterator as isize + i) as usize,
                        word,
                        WORD_SIZE,
                    );
                    i += WORD_SIZE as isize;
                    if i as usize >= m.length {
                        break;
                    }
                }

                output_iterator += m.length;
                control_word >>= 1;
            }
        }
    }

    /// Retrieves size and version information from a block without
    /// decompressing it
    pub fn compression_info(&self, source: &[u8]) -> Result<CompressionInfo> {
        let (header, _) = decode_header(source)?;

        Ok(CompressionInfo {
            uncompressed_size: header.uncompressed_size,
            compressed_size: header.compressed_size,
            version: header.version,
        })
    }
}
