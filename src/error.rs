//! Error handling for the treezip codec
//!
//! Every fallible operation in the crate reports one of a small set of
//! terminal outcomes. Errors are not recovered internally: the first failure
//! aborts the operation, and no partial output is meaningful afterwards.

use thiserror::Error;

/// Main error type for the treezip codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreezipError {
    /// A caller-supplied buffer is too small for the operation
    #[error("Buffer too small: needed {needed} bytes, available {available}")]
    BufferTooSmall {
        /// Number of bytes the operation requires
        needed: usize,
        /// Number of bytes actually available
        available: usize,
    },

    /// The compressed block is malformed or internally inconsistent
    #[error("Corrupted data: {message}")]
    CorruptedData {
        /// Description of the inconsistency
        message: String,
    },

    /// The block was encoded with an unknown format version
    #[error("Unsupported format version: {version}")]
    UnsupportedVersion {
        /// The version found in the block header
        version: u32,
    },

    /// Invalid compressor configuration
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl TreezipError {
    /// Create a buffer too small error
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create a corrupted data error
    pub fn corrupted_data<S: Into<String>>(message: S) -> Self {
        Self::CorruptedData { message: message.into() }
    }

    /// Create an unsupported version error
    pub fn unsupported_version(version: u32) -> Self {
        Self::UnsupportedVersion { version }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Buffer sizing problems can be fixed by the caller and retried;
    /// everything else is terminal for the given input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::BufferTooSmall { .. } => true,
            Self::CorruptedData { .. } => false,
            Self::UnsupportedVersion { .. } => false,
            Self::Configuration { .. } => true,
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::BufferTooSmall { .. } => "buffer",
            Self::CorruptedData { .. } => "data",
            Self::UnsupportedVersion { .. } => "version",
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TreezipError>;
