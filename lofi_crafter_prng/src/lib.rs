// Seedable random source for the lofi composition engine.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. Every random decision in `lofi_crafter_music` (tempo and
// key draws, progression choice, humanization jitter, note probabilities,
// swing) draws from a `LofiRng` that the caller owns and threads through
// `compose`. There is no process-wide generator: two compositions running on
// different threads each own their own instance, and a fixed seed reproduces
// a piece exactly.
//
// Integer sampling stays integer-only so the stream is identical on every
// platform. The float helpers are derived from the integer stream and are
// only used for probabilities and swing fractions.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LofiRng {
    s: [u64; 4],
}

impl LofiRng {
    /// Create a generator from a `u64` seed.
    ///
    /// Equal seeds yield equal output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent child generator, e.g. one per batch item.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`.
    ///
    /// Rejection sampling keeps the draw free of modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform signed integer in `[low, high]`, both ends inclusive.
    ///
    /// Panics if `low > high`.
    pub fn range_i64_inclusive(&mut self, low: i64, high: i64) -> i64 {
        assert!(low <= high, "range_i64_inclusive: low must be <= high");
        let span = high.abs_diff(low);
        if span == u64::MAX {
            return self.next_u64() as i64;
        }
        low.wrapping_add(self.range_u64(0, span + 1) as i64)
    }

    /// Uniform `f64` in `[low, high)`. Returns `low` when the range is empty.
    pub fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + self.next_f64() * (high - low)
    }

    /// `true` with probability `p`. `p <= 0.0` is never true and `p >= 1.0`
    /// is always true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.range_usize(0, items.len()))
        }
    }
}

/// SplitMix64 step, used only to expand the seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = LofiRng::new(42);
        let mut b = LofiRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = LofiRng::new(42);
        let mut b = LofiRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_fork_is_deterministic_and_independent() {
        let mut parent_a = LofiRng::new(7);
        let mut parent_b = LofiRng::new(7);
        let mut child_a = parent_a.fork();
        let mut child_b = parent_b.fork();
        assert_eq!(child_a, child_b);
        assert_ne!(child_a.next_u64(), parent_a.next_u64());
        assert_eq!(child_b.next_u64(), {
            let mut again = LofiRng::new(7);
            again.fork().next_u64()
        });
        // The parents keep moving in lockstep after forking.
        parent_b.next_u64();
        assert_eq!(parent_a, parent_b);
    }

    #[test]
    fn test_f64_in_unit_range() {
        let mut rng = LofiRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn test_range_u64_within_bounds() {
        let mut rng = LofiRng::new(999);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
        }
    }

    #[test]
    fn test_range_i64_inclusive_reaches_both_ends() {
        let mut rng = LofiRng::new(321);
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..10_000 {
            let v = rng.range_i64_inclusive(-3, 3);
            assert!((-3..=3).contains(&v), "range_i64_inclusive out of range: {v}");
            saw_low |= v == -3;
            saw_high |= v == 3;
        }
        assert!(saw_low && saw_high);
        assert_eq!(rng.range_i64_inclusive(5, 5), 5);
    }

    #[test]
    fn test_range_f64_within_bounds() {
        let mut rng = LofiRng::new(777);
        for _ in 0..10_000 {
            let v = rng.range_f64(0.58, 0.62);
            assert!((0.58..0.62).contains(&v), "range_f64 out of range: {v}");
        }
        assert_eq!(rng.range_f64(0.5, 0.5), 0.5);
    }

    #[test]
    fn test_random_bool_extremes() {
        let mut rng = LofiRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn test_random_bool_distribution() {
        let mut rng = LofiRng::new(42);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.random_bool(0.3)).count();
        let pct = hits as f64 / n as f64;
        assert!((0.25..0.35).contains(&pct), "expected ~30%, got {:.1}%", pct * 100.0);
    }

    #[test]
    fn test_choose_handles_empty_and_covers_all() {
        let mut rng = LofiRng::new(5);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());

        let items = ['a', 'b', 'c'];
        let mut seen = [false; 3];
        for _ in 0..1000 {
            let c = *rng.choose(&items).unwrap();
            seen[(c as u8 - b'a') as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut rng = LofiRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: LofiRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
