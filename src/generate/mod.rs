//! The streaming fuzzy-hash generator.
//!
//! A [`FuzzyState`] is a single-pass hashing session. Every input byte
//! updates a rolling hash and up to [`NUM_BLOCKHASHES`] accumulating block
//! hashes in lockstep; whenever the rolling hash marks a cut point for a
//! block size, that block hash emits one digest character and resets. The
//! finalizer then picks the block size whose digest is closest to the
//! target length and renders the two-part signature.
//!
//! The produced signature depends only on the byte stream, never on how it
//! was chunked across [`FuzzyState::update`] calls.

pub(crate) mod rolling;
mod sum_table;

use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use crate::error::{Result, SpamsumError};
use crate::signature::eliminate_sequences;

pub use rolling::ROLLING_WINDOW;

pub(crate) use sum_table::{sum_hash, BASE64, HASH_INIT};
use rolling::RollingHash;

/// Maximum number of characters in the first digest block.
pub const SPAMSUM_LENGTH: usize = 64;

/// Smallest usable block size; all block sizes are `MIN_BLOCKSIZE << i`.
pub const MIN_BLOCKSIZE: u64 = 3;

/// Number of parallel block-hash contexts a session can drive.
pub const NUM_BLOCKHASHES: usize = 31;

/// Block size hashed by context `index`.
#[inline]
pub(crate) const fn block_size_at(index: usize) -> u64 {
    MIN_BLOCKSIZE << index
}

/// Largest input, in bytes, for which a signature is defined.
pub const MAX_INPUT_SIZE: u64 = block_size_at(NUM_BLOCKHASHES - 1) * SPAMSUM_LENGTH as u64;

const HALF_LENGTH: usize = SPAMSUM_LENGTH / 2;
const MAX_RESULT_LEN: usize = 2 * SPAMSUM_LENGTH + 20;

/// Emission options for [`FuzzyState::digest_with`].
///
/// The defaults reproduce the reference tool's output byte for byte.
/// Signatures are normalized again during comparison regardless of how
/// they were emitted, so most callers never need to change these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestOptions {
    /// Collapse runs of four or more identical characters while emitting
    /// and suppress a tail character that would recreate such a run.
    pub eliminate_sequences: bool,
    /// Emit the second block at full length instead of truncating it to
    /// half a digest.
    pub no_truncate: bool,
}

/// One block-hash context: the accumulator and digest for a single block
/// size, plus the half-length snapshot used when the second signature
/// block is truncated.
#[derive(Debug, Clone, Copy)]
struct BlockHash {
    digest: [u8; SPAMSUM_LENGTH - 1],
    dindex: usize,
    /// Accumulating byte-hash, reset at every emitted character.
    h: u8,
    /// Like `h`, but frozen once the digest passes the half-length mark.
    half_h: u8,
    /// Character that would have been emitted had the digest not been
    /// full; `0` when absent.
    last_digest: u8,
    /// Character emitted when the digest first reached half length;
    /// `0` when absent.
    half_digest: u8,
}

impl BlockHash {
    const fn new() -> Self {
        BlockHash {
            digest: [0; SPAMSUM_LENGTH - 1],
            dindex: 0,
            h: HASH_INIT,
            half_h: HASH_INIT,
            last_digest: 0,
            half_digest: 0,
        }
    }

    fn clear_digest(&mut self) {
        self.dindex = 0;
        self.last_digest = 0;
    }

    /// Appends `c`, or records it as the pending tail character when the
    /// digest is already full. Returns whether the append happened.
    fn push(&mut self, c: u8) -> bool {
        if self.dindex < self.digest.len() {
            self.digest[self.dindex] = c;
            self.dindex += 1;
            true
        } else {
            self.last_digest = c;
            false
        }
    }

    fn truncate(&mut self, max_len: usize) {
        if self.dindex > max_len {
            self.dindex = max_len;
            self.last_digest = 0;
        }
    }

    fn digest_string(&self) -> String {
        // Digest bytes are alphabet characters, always ASCII.
        self.digest[..self.dindex].iter().map(|&b| b as char).collect()
    }
}

/// A streaming fuzzy-hash session.
///
/// Feed bytes with [`update`](Self::update) (in chunks of any size) and
/// render the signature with [`digest`](Self::digest). Digesting is
/// non-destructive: the same state can be digested repeatedly and may even
/// keep receiving bytes afterwards, although the reference implementation
/// discourages continuing a session past its first digest.
///
/// A state is exclusively owned by one hashing session; distinct states
/// can be used from different threads without synchronization.
#[derive(Debug, Clone)]
pub struct FuzzyState {
    roll: RollingHash,
    bh: [BlockHash; NUM_BLOCKHASHES],
    total_size: u64,
    /// Pre-declared total length, when the caller provided one.
    fixed_size: Option<u64>,
    reduce_border: u64,
    bh_start: usize,
    bh_end: usize,
    bh_end_limit: usize,
    rollmask: u32,
    /// Final byte-hash of the smallest block size once every digest is
    /// saturated and no further contexts can be forked.
    last_h: Option<u8>,
}

impl FuzzyState {
    /// Creates a fresh hashing session.
    pub fn new() -> Self {
        FuzzyState {
            roll: RollingHash::new(),
            bh: [BlockHash::new(); NUM_BLOCKHASHES],
            total_size: 0,
            fixed_size: None,
            reduce_border: MIN_BLOCKSIZE * SPAMSUM_LENGTH as u64,
            bh_start: 0,
            bh_end: 1,
            bh_end_limit: NUM_BLOCKHASHES - 1,
            rollmask: 0,
            last_h: None,
        }
    }

    /// Total number of bytes consumed so far.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Feeds a chunk of input. Chunk boundaries never affect the result.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.step(byte);
        }
    }

    /// Feeds a reader until exhaustion, returning the number of bytes
    /// consumed. The reader is not closed or rewound.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> std::io::Result<u64> {
        let mut buffer = [0u8; 8192];
        let mut consumed = 0u64;
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    self.update(&buffer[..n]);
                    consumed += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(consumed)
    }

    /// Declares the total input length ahead of time.
    ///
    /// This is purely an optimization hint: it bounds how many block-hash
    /// contexts the session will ever fork. Calling it again with the same
    /// value is a no-op; a different value is an error and leaves the
    /// state untouched. The declared length is enforced at digest time.
    pub fn set_total_input_length(&mut self, len: u64) -> Result<()> {
        if len > MAX_INPUT_SIZE {
            return Err(SpamsumError::SizeHintTooLarge { size: len });
        }
        if let Some(previous) = self.fixed_size {
            if previous != len {
                return Err(SpamsumError::SizeHintConflict {
                    previous,
                    requested: len,
                });
            }
        }
        self.fixed_size = Some(len);
        let mut bi = 0;
        while block_size_at(bi) * (SPAMSUM_LENGTH as u64) < len {
            bi += 1;
            if bi == NUM_BLOCKHASHES - 2 {
                break;
            }
        }
        self.bh_end_limit = bi + 1;
        Ok(())
    }

    /// Renders the signature for everything consumed so far, using the
    /// reference emission mode.
    pub fn digest(&self) -> Result<String> {
        self.digest_with(DigestOptions::default())
    }

    /// Renders the signature with explicit emission options.
    pub fn digest_with(&self, options: DigestOptions) -> Result<String> {
        if self.total_size > MAX_INPUT_SIZE {
            return Err(SpamsumError::InputTooLarge {
                size: self.total_size,
            });
        }
        if let Some(fixed) = self.fixed_size {
            if fixed != self.total_size {
                return Err(SpamsumError::FixedSizeMismatch {
                    expected: fixed,
                    actual: self.total_size,
                });
            }
        }

        let roll_sum = self.roll.sum();

        // Initial block-size guess from the total size, clamped to the
        // contexts that actually ran, then walked down until the digest is
        // long enough to be representative.
        let mut bi = self.bh_start;
        while block_size_at(bi) * (SPAMSUM_LENGTH as u64) < self.total_size {
            bi += 1;
        }
        if bi >= self.bh_end {
            bi = self.bh_end - 1;
        }
        while bi > self.bh_start && self.bh[bi].dindex < HALF_LENGTH {
            bi -= 1;
        }
        debug!(
            block_size = block_size_at(bi),
            total_size = self.total_size,
            "selected signature block size"
        );

        let mut out = String::with_capacity(MAX_RESULT_LEN);
        out.push_str(&block_size_at(bi).to_string());
        out.push(':');

        let first = &self.bh[bi];
        let mut block = first.digest_string();
        if options.eliminate_sequences {
            block = eliminate_sequences(&block);
        }
        let tail = if roll_sum != 0 {
            Some(BASE64[(first.h & 0x3f) as usize])
        } else {
            nonzero(first.last_digest)
        };
        if let Some(c) = tail {
            push_tail(&mut block, c, options.eliminate_sequences);
        }
        out.push_str(&block);
        out.push(':');

        if bi < self.bh_end - 1 {
            let mut second = self.bh[bi + 1];
            if !options.no_truncate {
                second.truncate(HALF_LENGTH - 1);
            }
            let mut block = second.digest_string();
            if options.eliminate_sequences {
                block = eliminate_sequences(&block);
            }
            let tail = if roll_sum != 0 {
                let h = if options.no_truncate {
                    second.h
                } else {
                    second.half_h
                };
                Some(BASE64[(h & 0x3f) as usize])
            } else if options.no_truncate {
                nonzero(second.last_digest)
            } else {
                nonzero(second.half_digest)
            };
            if let Some(c) = tail {
                push_tail(&mut block, c, options.eliminate_sequences);
            }
            out.push_str(&block);
        } else if roll_sum != 0 {
            // A single active context only happens at the extremes: either
            // nothing was ever forked (smallest block size) or everything
            // was reduced away (largest). The one-character second block
            // cannot form a run, so no guard is needed.
            let h = if bi == 0 {
                self.bh[bi].h
            } else {
                self.last_h.unwrap_or(0)
            };
            out.push(BASE64[(h & 0x3f) as usize] as char);
        }
        Ok(out)
    }

    fn step(&mut self, byte: u8) {
        self.total_size += 1;
        self.roll.update(byte);
        let horg = self.roll.sum().wrapping_add(1);
        let mut h = horg / MIN_BLOCKSIZE as u32;

        for i in self.bh_start..self.bh_end {
            self.bh[i].h = sum_hash(self.bh[i].h, byte);
            self.bh[i].half_h = sum_hash(self.bh[i].half_h, byte);
        }
        if let Some(last) = self.last_h {
            self.last_h = Some(sum_hash(last, byte));
        }

        // A sum of 0xffffffff is not congruent to -1 modulo 3; the wrapped
        // zero must not be treated as a trigger.
        if horg == 0 {
            return;
        }
        // With growing block size almost every byte fails this mask test,
        // so it runs before the modulo.
        if h & self.rollmask != 0 {
            return;
        }
        if horg % MIN_BLOCKSIZE as u32 != 0 {
            return;
        }

        h >>= self.bh_start;

        let mut i = self.bh_start;
        loop {
            // A cut point for this block size: emit one digest character
            // based on everything since the previous cut, then reset.
            if self.bh[i].dindex == 0 {
                self.try_fork();
            }

            self.bh[i].half_digest = BASE64[(self.bh[i].half_h & 0x3f) as usize];
            let c = BASE64[(self.bh[i].h & 0x3f) as usize];
            if self.bh[i].push(c) {
                // Only reset while there is room left; once the digest is
                // full the remaining input keeps accumulating into the
                // final piece.
                self.bh[i].h = HASH_INIT;
                if self.bh[i].dindex < HALF_LENGTH {
                    self.bh[i].half_h = HASH_INIT;
                    self.bh[i].half_digest = 0;
                }
            } else {
                self.try_reduce();
            }

            if h & 1 != 0 {
                break;
            }
            h >>= 1;
            i += 1;
            if i >= self.bh_end {
                break;
            }
        }
    }

    /// Starts hashing the next (doubled) block size, seeded with the state
    /// of the current largest one.
    fn try_fork(&mut self) {
        let source = self.bh[self.bh_end - 1];
        if self.bh_end <= self.bh_end_limit {
            let next = &mut self.bh[self.bh_end];
            next.h = source.h;
            next.half_h = source.half_h;
            next.clear_digest();
            next.half_digest = 0;
            self.bh_end += 1;
            trace!(index = self.bh_end - 1, "forked block-hash context");
        } else if self.bh_end == NUM_BLOCKHASHES && self.last_h.is_none() {
            self.last_h = Some(source.h);
        }
    }

    /// Retires the smallest block size once the finalizer can no longer
    /// select it.
    fn try_reduce(&mut self) {
        if self.bh_end - self.bh_start < 2 {
            return;
        }
        let size = self.fixed_size.unwrap_or(self.total_size);
        if self.reduce_border >= size {
            return;
        }
        if self.bh[self.bh_start + 1].dindex < HALF_LENGTH {
            return;
        }
        self.bh_start += 1;
        self.reduce_border *= 2;
        self.rollmask = (self.rollmask << 1) | 1;
        trace!(start = self.bh_start, "retired smallest block-hash context");
    }
}

impl Default for FuzzyState {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn nonzero(c: u8) -> Option<u8> {
    (c != 0).then_some(c)
}

/// Appends the tail character unless, in elimination mode, it would extend
/// a run of three identical characters already ending the block.
fn push_tail(block: &mut String, c: u8, eliminating: bool) {
    let bytes = block.as_bytes();
    let n = bytes.len();
    if !eliminating || n < 3 || c != bytes[n - 1] || c != bytes[n - 2] || c != bytes[n - 3] {
        block.push(c as char);
    }
}
