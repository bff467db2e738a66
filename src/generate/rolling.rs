//! The 32-bit rolling hash that drives trigger detection.
//!
//! The engine never emits rolling-hash values into a digest; the hash only
//! answers one question per byte: "is this a natural cut point for block
//! size `3 << k`?". The same window is also reused by the comparator's
//! common-substring pre-filter, which is why the window length doubles as
//! the minimum comparable block-string length.

/// Width of the sliding window, in bytes.
pub const ROLLING_WINDOW: usize = 7;

/// Rolling hash over the last [`ROLLING_WINDOW`] bytes of input.
///
/// The value is the 32-bit wrapping sum of three components:
/// - `h1`: plain sum of the window bytes,
/// - `h2`: age-weighted sum (the newest byte has weight 7, the oldest 1),
/// - `h3`: shift-5 XOR polynomial over every byte ever consumed (older
///   bytes fall off the high end once the window has passed them).
///
/// There is no finalization; the value can be read between any two updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollingHash {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    index: usize,
}

impl RollingHash {
    /// Creates a hash with an all-zero window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slides the window forward by one byte.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.h2 = self.h2.wrapping_sub(self.h1);
        self.h2 = self
            .h2
            .wrapping_add((ROLLING_WINDOW as u32).wrapping_mul(byte as u32));
        self.h1 = self.h1.wrapping_add(byte as u32);
        self.h1 = self.h1.wrapping_sub(self.window[self.index] as u32);
        self.window[self.index] = byte;
        self.index += 1;
        if self.index == ROLLING_WINDOW {
            self.index = 0;
        }
        self.h3 = (self.h3 << 5) ^ byte as u32;
    }

    /// Current hash value: `h1 + h2 + h3` with 32-bit wrapping addition.
    #[inline]
    pub fn sum(&self) -> u32 {
        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_sums_to_zero() {
        assert_eq!(RollingHash::new().sum(), 0);
    }

    #[test]
    fn known_sum_after_abc() {
        // h1 = 294, h2 = 1766, h3 = 100387 after feeding "abc".
        let mut roll = RollingHash::new();
        for &b in b"abc" {
            roll.update(b);
        }
        assert_eq!(roll.sum(), 102_447);
    }

    #[test]
    fn trigger_alignment_after_ab() {
        // "ab" is the shortest prefix of "abc" whose sum + 1 is divisible
        // by the minimum block size; the engine emits its first digest
        // character there.
        let mut roll = RollingHash::new();
        roll.update(b'a');
        assert_eq!((roll.sum().wrapping_add(1)) % 3, 1);
        roll.update(b'b');
        assert_eq!(roll.sum().wrapping_add(1), 4602);
        assert_eq!(4602 % 3, 0);
    }

    #[test]
    fn window_slides_past_old_bytes() {
        // Once more than ROLLING_WINDOW bytes are in, h1 must be the sum of
        // only the last seven.
        let data = b"0123456789";
        let mut roll = RollingHash::new();
        for &b in data {
            roll.update(b);
        }
        let expected: u32 = data[data.len() - ROLLING_WINDOW..]
            .iter()
            .map(|&b| b as u32)
            .sum();
        assert_eq!(roll.h1, expected);
    }

    #[test]
    fn update_matches_reference_recurrence() {
        // Cross-check the incremental update against a from-scratch
        // recomputation of h1/h2 on every step.
        let data: Vec<u8> = (0u16..64).map(|i| (i * 37 % 251) as u8).collect();
        let mut roll = RollingHash::new();
        let mut history: Vec<u8> = Vec::new();
        for &b in &data {
            roll.update(b);
            history.push(b);
            let window: Vec<u8> = history
                .iter()
                .rev()
                .take(ROLLING_WINDOW)
                .rev()
                .copied()
                .collect();
            let h1: u32 = window.iter().map(|&x| x as u32).sum();
            let h2: u32 = window
                .iter()
                .enumerate()
                .map(|(i, &x)| (i as u32 + 1 + (ROLLING_WINDOW - window.len()) as u32) * x as u32)
                .sum();
            assert_eq!(roll.h1, h1);
            assert_eq!(roll.h2, h2);
        }
    }
}
