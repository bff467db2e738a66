//! Signature comparison: compatibility dispatch, pre-filtering and scoring.
//!
//! Comparison is a pure function of two signatures. Each side is parsed
//! and normalized, the block sizes decide which block pairs are
//! comparable, a common-substring gate rejects obviously unrelated
//! strings, and a length-normalized edit distance produces the final
//! score in `0..=100`.

mod common_substring;
mod edit_distance;

use common_substring::PatternMasks;

use crate::generate::{MIN_BLOCKSIZE, ROLLING_WINDOW, SPAMSUM_LENGTH};
use crate::signature::Signature;

/// Block sizes at or above this value escape the score cap for short
/// block strings.
const UNCAPPED_BLOCKSIZE: u64 =
    (99 + ROLLING_WINDOW as u64).div_ceil(ROLLING_WINDOW as u64) * MIN_BLOCKSIZE;

/// Compares two signature strings.
///
/// Returns:
/// - `-1` if either string is malformed,
/// - `0` for no similarity, including incompatible block sizes,
/// - `1..=100` otherwise, `100` meaning identical signatures.
pub fn compare(a: &str, b: &str) -> i32 {
    match (Signature::parse(a), Signature::parse(b)) {
        (Ok(sig_a), Ok(sig_b)) => compare_signatures(&sig_a, &sig_b),
        _ => -1,
    }
}

/// Two block sizes are comparable when equal or off by exactly one
/// doubling.
fn block_sizes_compatible(a: u64, b: u64) -> bool {
    a == b || a.checked_mul(2) == Some(b) || b.checked_mul(2) == Some(a)
}

pub(crate) fn compare_signatures(a: &Signature, b: &Signature) -> i32 {
    if !block_sizes_compatible(a.block_size(), b.block_size()) {
        return 0;
    }

    if a.block_size() == b.block_size()
        && a.block1() == b.block1()
        && a.block2() == b.block2()
    {
        return 100;
    }

    // Each side's second block is hashed at twice its first block's size,
    // which is what makes neighboring block sizes comparable at all.
    let score = if a.block_size() == b.block_size() {
        let s1 = score_strings(a.block1(), b.block1(), a.block_size());
        let s2 = score_strings(
            a.block2(),
            b.block2(),
            a.block_size().saturating_mul(2),
        );
        s1.max(s2)
    } else if a.block_size().checked_mul(2) == Some(b.block_size()) {
        score_strings(a.block2(), b.block1(), b.block_size())
    } else {
        score_strings(a.block1(), b.block2(), a.block_size())
    };
    score as i32
}

/// Scores a pair of normalized block strings hashed at `block_size`.
fn score_strings(s1: &str, s2: &str, block_size: u64) -> u32 {
    let (mut s1, mut s2) = (s1.as_bytes(), s2.as_bytes());
    if s1.len() < ROLLING_WINDOW || s2.len() < ROLLING_WINDOW {
        return 0;
    }
    if s1.len() > s2.len() {
        std::mem::swap(&mut s1, &mut s2);
    }

    let distance = if s1.len() <= 64 {
        let masks = PatternMasks::new(s1);
        if !common_substring::scan_bitmask(&masks, s2) {
            return 0;
        }
        edit_distance::myers(&masks, s1.len(), s2)
    } else {
        if !common_substring::scan_rolling(s1, s2) {
            return 0;
        }
        edit_distance::wagner_fischer(s1, s2)
    };

    // Rescale the distance to a proportion of the two strings and flip it
    // into a similarity.
    let total_len = (s1.len() + s2.len()) as u64;
    let mut score = (distance as u64 * SPAMSUM_LENGTH as u64 / total_len) as u32;
    score = (100 * score as u64 / SPAMSUM_LENGTH as u64) as u32;
    score = 100 - score;

    // At small block sizes a short string cannot carry enough evidence for
    // a high score; cap it in proportion to the matchable material.
    if block_size >= UNCAPPED_BLOCKSIZE {
        return score;
    }
    let cap = (block_size / MIN_BLOCKSIZE).saturating_mul(s1.len() as u64);
    if (score as u64) > cap {
        cap as u32
    } else {
        score
    }
}
