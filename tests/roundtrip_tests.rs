//! End-to-End Round-Trip Test Suite
//!
//! Exercises the public compression surface over the data shapes that
//! matter in practice: repetitive text, constant runs, incompressible
//! noise, and arbitrary byte strings via property testing. Every block is
//! decoded back and compared byte for byte.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use treezip::{max_compressed_size, Compressor, Decompressor, TreezipError};

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

/// Generate test data with varying patterns for compression testing
struct TestDataGenerator;

impl TestDataGenerator {
    /// Highly repetitive text data
    fn repetitive_text(size: usize) -> Vec<u8> {
        let pattern = b"the quick brown fox jumps over the lazy dog ";
        let mut data = Vec::with_capacity(size);
        while data.len() < size {
            let remaining = size - data.len();
            if remaining >= pattern.len() {
                data.extend_from_slice(pattern);
            } else {
                data.extend_from_slice(&pattern[..remaining]);
            }
        }
        data
    }

    /// Uniformly random data (poor compression scenario)
    fn random_data(size: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..size).map(|_| rng.gen()).collect()
    }

    /// A single repeated byte
    fn repeated_bytes(size: usize, byte_value: u8) -> Vec<u8> {
        vec![byte_value; size]
    }

    /// Text-like data with long-range repeats
    fn structured_text(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut counter = 0usize;
        while data.len() < size {
            data.extend_from_slice(format!("record {:06}: status=ok flags=0x00 ", counter).as_bytes());
            counter += 1;
        }
        data.truncate(size);
        data
    }
}

/// Compress `input`, assert the size bound, decompress, and compare
fn assert_round_trip(input: &[u8]) -> Vec<u8> {
    let bound = max_compressed_size(input.len());
    let mut compressed = vec![0u8; bound];

    let mut compressor = Compressor::new();
    let compressed_size = compressor
        .compress(input, &mut compressed)
        .expect("compression failed");
    assert!(compressed_size <= bound);
    compressed.truncate(compressed_size);

    let decompressor = Decompressor::new();
    let info = decompressor
        .compression_info(&compressed)
        .expect("header unreadable");
    assert_eq!(info.uncompressed_size, input.len() as u64);
    assert_eq!(info.compressed_size, compressed_size as u64);
    assert_eq!(info.version, treezip::VERSION);

    let mut output = vec![0u8; input.len()];
    decompressor
        .decompress(&compressed, &mut output)
        .expect("decompression failed");
    assert_eq!(&output[..], input);

    compressed
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn test_empty_input_rejected() {
    let mut compressor = Compressor::new();
    let mut output = vec![0u8; 64];
    assert!(matches!(
        compressor.compress(&[], &mut output),
        Err(TreezipError::BufferTooSmall { .. })
    ));
}

#[test]
fn test_single_byte() {
    assert_round_trip(b"x");
}

#[test]
fn test_short_repetitive_string() {
    // Too short for the match window to engage; still must round-trip
    assert_round_trip(b"abcabcabcabc");
}

#[test]
fn test_repeated_pangram() {
    let input: Vec<u8> = b"the quick brown fox jumps ".repeat(10);
    let compressed = assert_round_trip(&input);
    assert!(compressed.len() < input.len());
}

#[test]
fn test_one_mebibyte_constant_run() {
    let input = TestDataGenerator::repeated_bytes(1 << 20, 0x42);
    let compressed = assert_round_trip(&input);
    assert!(compressed.len() * 16 < input.len());
}

#[test]
fn test_random_block_falls_back_to_stored() {
    let input = TestDataGenerator::random_data(4096, 0xA11CE);
    let compressed = assert_round_trip(&input);

    // Stored mode: header (5 bytes at this size class) plus the input,
    // copied verbatim
    assert_eq!(compressed.len(), input.len() + 5);
    assert_eq!(&compressed[5..], &input[..]);
}

#[test]
fn test_repetitive_text_compresses() {
    let input = TestDataGenerator::repetitive_text(64 * 1024);
    let compressed = assert_round_trip(&input);
    assert!(compressed.len() * 4 < input.len());
}

#[test]
fn test_structured_text_compresses() {
    let input = TestDataGenerator::structured_text(128 * 1024);
    let compressed = assert_round_trip(&input);
    assert!(compressed.len() < input.len());
}

#[test]
fn test_all_byte_values() {
    let input: Vec<u8> = (0u8..=255).cycle().take(8192).collect();
    assert_round_trip(&input);
}

#[test]
fn test_sizes_around_matchability_threshold() {
    // Below, at, and above the point where the match window opens
    for size in 1..=64 {
        let input = TestDataGenerator::repetitive_text(size);
        assert_round_trip(&input);
    }
}

#[test]
fn test_sizes_around_size_class_boundaries() {
    for &size in &[246usize, 247, 250, 255, 256, 65_526, 65_527, 65_600] {
        let input = TestDataGenerator::repetitive_text(size);
        assert_round_trip(&input);
    }
}

#[test]
fn test_compressor_instance_reuse() {
    let mut compressor = Compressor::new();
    let decompressor = Decompressor::new();

    for seed in 0..4u64 {
        let input = if seed % 2 == 0 {
            TestDataGenerator::repetitive_text(10_000)
        } else {
            TestDataGenerator::random_data(10_000, seed)
        };

        let mut compressed = vec![0u8; max_compressed_size(input.len())];
        let compressed_size = compressor.compress(&input, &mut compressed).unwrap();

        let mut output = vec![0u8; input.len()];
        decompressor
            .decompress(&compressed[..compressed_size], &mut output)
            .unwrap();
        assert_eq!(output, input);
    }
    assert_eq!(compressor.stats().blocks_compressed, 4);
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_arbitrary_bytes_round_trip(input in proptest::collection::vec(any::<u8>(), 1..2048)) {
        assert_round_trip(&input);
    }

    #[test]
    fn prop_repeat_structured_round_trip(
        pattern in proptest::collection::vec(any::<u8>(), 1..48),
        repeats in 1usize..128,
    ) {
        let input: Vec<u8> = pattern
            .iter()
            .cycle()
            .take(pattern.len() * repeats)
            .copied()
            .collect();
        assert_round_trip(&input);
    }

    #[test]
    fn prop_compressed_size_within_bound(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
        let mut compressed = vec![0u8; max_compressed_size(input.len())];
        let size = Compressor::new().compress(&input, &mut compressed).unwrap();
        prop_assert!(size <= max_compressed_size(input.len()));
    }
}
