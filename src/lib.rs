//! # Treezip: Single-Block LZ Compression
//!
//! This crate implements a lossless LZ-family codec for whole in-memory
//! buffers. A compressed block is self-describing: a small header followed
//! by a bit-packed body, decoding back to exactly the original bytes.
//!
//! ## Key Features
//!
//! - **BST-forest match finder**: a hash-indexed forest of binary search
//!   trees over a 2 MiB cyclic window, locating progressively longer
//!   repeats while rebuilding itself on every step
//! - **Compact token stream**: 32-bit control words tag literals and
//!   matches; matches code in 1-4 bytes with a prefix-tag scheme
//! - **Lazy matching**: a one-position look-ahead trades a match for a
//!   literal when the next position codes better per byte
//! - **Stored fallback**: incompressible blocks degrade to a verbatim
//!   copy, bounding output at [`max_compressed_size`]
//! - **Memory safety**: decoding untrusted input returns an error, never
//!   panics, and never touches memory outside the supplied buffers
//!
//! ## Quick Start
//!
//! ```rust
//! use treezip::{max_compressed_size, Compressor, Decompressor};
//!
//! let input = b"a man a plan a canal panama, a man a plan a canal panama";
//!
//! // Compress into a caller-sized buffer
//! let mut compressed = vec![0u8; max_compressed_size(input.len())];
//! let mut compressor = Compressor::new();
//! let compressed_size = compressor.compress(input, &mut compressed)?;
//! compressed.truncate(compressed_size);
//!
//! // Inspect the block, then decompress
//! let decompressor = Decompressor::new();
//! let info = decompressor.compression_info(&compressed)?;
//! let mut output = vec![0u8; info.uncompressed_size as usize];
//! decompressor.decompress(&compressed, &mut output)?;
//!
//! assert_eq!(&output[..], &input[..]);
//! # Ok::<(), treezip::TreezipError>(())
//! ```
//!
//! ## Scope
//!
//! The codec operates on single blocks only: no streaming, no framing of
//! concatenated blocks, no checksums, no metadata. Buffers are supplied by
//! the caller, sized with [`max_compressed_size`] on the way in and the
//! header's uncompressed size on the way out.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod format;

mod compressor;
mod decompressor;
mod match_codec;
mod match_finder;
mod wordio;

pub use config::CompressorConfig;
pub use error::{Result, TreezipError};
pub use format::{
    max_compressed_size, DICTIONARY_SIZE, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, VERSION,
};

pub use compressor::{CompressionStats, Compressor};
pub use decompressor::{CompressionInfo, Decompressor};
