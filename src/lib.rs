//! Context-triggered piecewise hashing (CTPH), wire-compatible with ssdeep.
//!
//! A fuzzy hash is a short textual signature of a byte stream; two
//! signatures can be compared for a similarity score in `0..=100` that
//! approximates how much of the inputs' structure they share. The format
//! and scores produced here are byte-identical to the reference ssdeep
//! implementation, which makes the signatures directly usable for malware
//! triage, near-duplicate detection, and content-similarity search
//! against existing corpora.
//!
//! # Hashing
//!
//! ```
//! let sig = spamsum::hash(b"Hello, ssdeep4j! This is a test string for fuzzy hashing.")?;
//! assert_eq!(sig, "3:a62AVpAFVEpFZgMFMEFZL:aELAFurNFME3");
//! # Ok::<(), spamsum::SpamsumError>(())
//! ```
//!
//! Streams of unknown length go through [`FuzzyState`] (or [`hash_stream`]);
//! the signature never depends on how the input was chunked.
//!
//! # Comparing
//!
//! ```
//! let score = spamsum::compare("48:abcdefgh:abcdefgh", "48:abcdefgi:abcdefgi");
//! assert_eq!(score, 88);
//! ```
//!
//! Parse signatures into [`Signature`] values to amortize parsing when one
//! hash is matched against many.

/// Signature comparison and scoring
pub mod compare;

/// Error types and error handling
pub mod error;

/// The streaming hash generator
pub mod generate;

/// Logging and tracing infrastructure
pub mod logging;

/// Parsed signature values
pub mod signature;

pub use compare::compare;
pub use error::{Result, SpamsumError};
pub use generate::{
    DigestOptions, FuzzyState, MAX_INPUT_SIZE, MIN_BLOCKSIZE, NUM_BLOCKHASHES, ROLLING_WINDOW,
    SPAMSUM_LENGTH,
};
pub use signature::{eliminate_sequences, Signature};

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

/// Computes the fuzzy hash of an in-memory buffer.
pub fn hash(data: &[u8]) -> Result<String> {
    let mut state = FuzzyState::new();
    state.update(data);
    state.digest()
}

/// Computes the fuzzy hash of a byte source, reading it to exhaustion.
///
/// The source is not closed; chunking of the underlying reads does not
/// affect the signature.
pub fn hash_stream<R: Read>(reader: R) -> Result<String> {
    let mut state = FuzzyState::new();
    let consumed = state.update_reader(reader)?;
    debug!(bytes = consumed, "hashed stream");
    state.digest()
}

/// Computes the fuzzy hash of a file.
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), "hashing file");
    hash_stream(BufReader::new(file))
}
