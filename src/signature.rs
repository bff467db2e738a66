//! Parsed signature values and the shared run-length normalization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpamsumError;

/// Collapses every run of four or more identical characters to exactly
/// three.
///
/// Signatures of repetitive inputs carry long character runs that say
/// little about content; both the emitter (optionally) and the comparator
/// (always) normalize them away. The operation is idempotent, so applying
/// it to an already-normalized block is harmless.
pub fn eliminate_sequences(input: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(input.len());
    for c in input.chars() {
        let n = out.len();
        if n < 3 || c != out[n - 1] || c != out[n - 2] || c != out[n - 3] {
            out.push(c);
        }
    }
    out.into_iter().collect()
}

/// A parsed fuzzy-hash signature: `<blocksize>:<block1>:<block2>`.
///
/// Parsing normalizes both blocks with [`eliminate_sequences`], so two
/// `Signature`s compare equal whenever the comparator would treat their
/// textual forms as identical. Parsing does not require the block size to
/// be one of the sizes the generator can emit; a signature with a
/// non-standard size is simply incompatible with every standard one and
/// only scores against itself.
///
/// Pre-parsing is worthwhile when one signature is compared against many:
/// it hoists the block-size digits and normalization out of the loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    block_size: u64,
    block1: String,
    block2: String,
}

impl Signature {
    /// Parses a signature string.
    pub fn parse(text: &str) -> Result<Self, SpamsumError> {
        let first = text.find(':').ok_or(SpamsumError::MalformedSignature {
            reason: "missing block separator",
        })?;
        let rest = &text[first + 1..];
        let second = rest.find(':').ok_or(SpamsumError::MalformedSignature {
            reason: "missing second block separator",
        })?;
        let block_size: u64 =
            text[..first]
                .parse()
                .map_err(|_| SpamsumError::MalformedSignature {
                    reason: "block size is not a non-negative decimal integer",
                })?;
        Ok(Signature {
            block_size,
            block1: eliminate_sequences(&rest[..second]),
            // Anything after the second separator belongs to the second
            // block; extra colons are not rejected.
            block2: eliminate_sequences(&rest[second + 1..]),
        })
    }

    /// The block size the first block was hashed at (the second block uses
    /// twice this).
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// First digest block, normalized.
    pub fn block1(&self) -> &str {
        &self.block1
    }

    /// Second digest block, normalized.
    pub fn block2(&self) -> &str {
        &self.block2
    }

    /// Compares against another parsed signature. See [`crate::compare`]
    /// for the score contract.
    pub fn compare(&self, other: &Signature) -> i32 {
        crate::compare::compare_signatures(self, other)
    }

    /// Compares against a signature string; `-1` if `other` is malformed.
    pub fn compare_str(&self, other: &str) -> i32 {
        match Signature::parse(other) {
            Ok(parsed) => self.compare(&parsed),
            Err(_) => -1,
        }
    }
}

impl FromStr for Signature {
    type Err = SpamsumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::parse(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.block_size, self.block1, self.block2)
    }
}
