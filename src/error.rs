//! Error types for fuzzy hashing and signature parsing.
//!
//! All fallible operations in this crate return [`SpamsumError`] through the
//! crate-wide [`Result`] alias. Comparison is the one exception: it keeps the
//! classic ssdeep sentinel contract (`-1` for malformed input) instead of an
//! error type, so scores can be stored and ranked as plain integers.

use thiserror::Error;

/// Main error type for spamsum operations.
#[derive(Debug, Error)]
pub enum SpamsumError {
    /// Byte-source failure while feeding a hashing session.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// More input was consumed than a signature can represent.
    #[error("input of {size} bytes exceeds the maximum hashable size")]
    InputTooLarge { size: u64 },

    /// A pre-declared total length did not match the bytes actually consumed.
    #[error("declared input length {expected} but {actual} bytes were hashed")]
    FixedSizeMismatch { expected: u64, actual: u64 },

    /// A total-length hint larger than any signature can represent.
    #[error("length hint of {size} bytes exceeds the maximum hashable size")]
    SizeHintTooLarge { size: u64 },

    /// A second, conflicting total-length hint.
    #[error("input length already declared as {previous}, cannot change to {requested}")]
    SizeHintConflict { previous: u64, requested: u64 },

    /// A signature string that does not match `<blocksize>:<block1>:<block2>`.
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: &'static str },
}

/// Result type alias for spamsum operations.
pub type Result<T> = std::result::Result<T, SpamsumError>;
