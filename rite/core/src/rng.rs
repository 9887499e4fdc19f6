//! Deterministic Random Streams
//!
//! Every visible choice in a cycle (symmetry, hue, petal jitter, which line of
//! the lexicon is spoken) is drawn from a [`Stream`]. A stream is a xorshift32
//! generator over a single `u32` word, so the same seed yields a bit-identical
//! sequence on every platform: the core is pure integer arithmetic and the
//! float conversion is exact in `f64`.
//!
//! Streams are cheap to copy. Cloning one restarts nothing; it forks the
//! sequence at the current position, which is how callers "replay" a draw.

use serde::{Deserialize, Serialize};

/// Replacement for seed 0, which is a fixed point of xorshift
pub const ZERO_SEED_FALLBACK: u32 = 0x1234_5678;

/// 2^32 as a float, the normalisation divisor for [`Stream::next_f64`]
const U32_RANGE: f64 = 4_294_967_296.0;

/// Seeded xorshift32 stream
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    state: u32,
}

impl Stream {
    /// Create a stream from a raw seed
    ///
    /// Seed 0 is silently remapped to [`ZERO_SEED_FALLBACK`].
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_FALLBACK } else { seed },
        }
    }

    /// Advance the state and return the new word
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next draw as a float in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / U32_RANGE
    }

    /// Next draw scaled to `[min, max)`
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Index in `0..len`, computed as `floor(draw * len)`
    ///
    /// Returns 0 for an empty range (the draw is still consumed so the
    /// sequence position does not depend on `len`).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn below(&mut self, len: usize) -> usize {
        let draw = self.next_f64();
        if len == 0 {
            return 0;
        }
        ((draw * len as f64).floor() as usize).min(len - 1)
    }

    /// Pick one element of a slice, or `None` when it is empty
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let idx = self.below(items.len());
        items.get(idx)
    }

    /// Current internal word (never zero)
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_sequence_for_seed_one() {
        // If this breaks, every saved seed renders a different mandala.
        let mut s = Stream::new(1);
        assert_eq!(s.next_u32(), 270_369);
        assert_eq!(s.next_u32(), 67_634_689);
        assert_eq!(s.next_u32(), 2_647_435_461);
    }

    #[test]
    fn test_zero_seed_is_remapped() {
        let mut zero = Stream::new(0);
        let mut fallback = Stream::new(ZERO_SEED_FALLBACK);
        assert_eq!(zero.state(), ZERO_SEED_FALLBACK);
        for _ in 0..64 {
            assert_eq!(zero.next_u32(), fallback.next_u32());
        }
        assert_eq!(Stream::new(0).next_u32(), 2_274_908_837);
    }

    #[test]
    fn test_fresh_streams_are_identical() {
        for seed in [1_u32, 7, 42, 0xDEAD_BEEF, u32::MAX] {
            let a: Vec<u64> = {
                let mut s = Stream::new(seed);
                (0..256).map(|_| s.next_f64().to_bits()).collect()
            };
            let b: Vec<u64> = {
                let mut s = Stream::new(seed);
                (0..256).map(|_| s.next_f64().to_bits()).collect()
            };
            assert_eq!(a, b, "seed {seed} diverged");
        }
    }

    #[test]
    fn test_draws_stay_in_unit_interval() {
        let mut s = Stream::new(0xFFFF_FFFF);
        for _ in 0..100_000 {
            let v = s.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_state_never_hits_zero() {
        let mut s = Stream::new(99);
        for _ in 0..100_000 {
            assert_ne!(s.next_u32(), 0);
        }
    }

    #[test]
    fn test_below_and_pick() {
        let mut s = Stream::new(42);
        for _ in 0..1000 {
            assert!(s.below(6) < 6);
        }
        assert_eq!(s.below(0), 0);
        let empty: [u8; 0] = [];
        assert!(s.pick(&empty).is_none());
        assert!(s.pick(&["only"]).is_some());
    }

    #[test]
    fn test_clone_forks_sequence() {
        let mut a = Stream::new(5);
        a.next_u32();
        let mut b = a;
        assert_eq!(a.next_u32(), b.next_u32());
    }
}
