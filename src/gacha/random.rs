//! Cryptographically secure randomness primitives.
//!
//! Every draw in the engine goes through [`SecureRandomSource`]. The production
//! source reads from the operating system CSPRNG; tests and simulations inject a
//! seeded source through the same trait object.

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RandomError {
    #[error("cannot choose from an empty list")]
    Empty,

    #[error("got {items} items but {weights} weights")]
    LengthMismatch { items: usize, weights: usize },

    #[error("weight at index {0} is negative or not finite")]
    InvalidWeight(usize),

    #[error("total weight must be positive and finite")]
    ZeroTotalWeight,

    #[error("invalid range [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("cannot sample {requested} items from {available}")]
    SampleTooLarge { requested: usize, available: usize },
}

/// Uniform randomness with the engine's derived operations.
///
/// Implementors only provide [`next_u64`](SecureRandomSource::next_u64); every
/// other method is derived from it so that all sources share the same
/// (unbiased) algorithms.
pub trait SecureRandomSource: Send + Sync {
    fn next_u64(&self) -> u64;

    /// Uniform float in `[0, 1)` built from the top 53 bits.
    fn uniform(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[0, bound)`, rejection sampled. Returns 0 when `bound == 0`.
    fn below(&self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        // Largest accepted value: the count of accepted values is a multiple of `bound`.
        let zone = u64::MAX - (u64::MAX - bound + 1) % bound;
        loop {
            let v = self.next_u64();
            if v <= zone {
                return v % bound;
            }
        }
    }

    /// Uniform integer in the closed range `[min, max]`.
    fn bounded_int(&self, min: i64, max: i64) -> Result<i64, RandomError> {
        if min > max {
            return Err(RandomError::InvalidRange { min, max });
        }
        let span = max.wrapping_sub(min) as u64;
        if span == u64::MAX {
            return Ok(self.next_u64() as i64);
        }
        Ok(min.wrapping_add(self.below(span + 1) as i64))
    }

    fn chance(&self, p: f64) -> Result<bool, RandomError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(RandomError::InvalidProbability(p));
        }
        Ok(self.uniform() < p)
    }

    /// Index `i` with probability `weights[i] / sum(weights)`.
    fn weighted_index(&self, weights: &[f64]) -> Result<usize, RandomError> {
        if weights.is_empty() {
            return Err(RandomError::Empty);
        }
        let mut total = 0.0;
        for (i, w) in weights.iter().enumerate() {
            if !w.is_finite() || *w < 0.0 {
                return Err(RandomError::InvalidWeight(i));
            }
            total += w;
        }
        if !(total > 0.0 && total.is_finite()) {
            return Err(RandomError::ZeroTotalWeight);
        }

        let target = self.uniform() * total;
        let mut acc = 0.0;
        for (i, w) in weights.iter().enumerate() {
            acc += w;
            if *w > 0.0 && target < acc {
                return Ok(i);
            }
        }
        // Rounding at the upper boundary: fall back to the last drawable item.
        weights
            .iter()
            .rposition(|w| *w > 0.0)
            .ok_or(RandomError::ZeroTotalWeight)
    }
}

/// Generic helpers layered on top of any [`SecureRandomSource`], including trait objects.
pub trait RandomExt: SecureRandomSource {
    fn weighted_choice<'a, T>(
        &self,
        items: &'a [T],
        weights: &[f64],
    ) -> Result<&'a T, RandomError> {
        if items.len() != weights.len() {
            return Err(RandomError::LengthMismatch {
                items: items.len(),
                weights: weights.len(),
            });
        }
        let idx = self.weighted_index(weights)?;
        Ok(&items[idx])
    }

    /// Fisher-Yates shuffle.
    fn shuffle<T>(&self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// `count` distinct elements in random order.
    fn sample<T: Clone>(&self, items: &[T], count: usize) -> Result<Vec<T>, RandomError> {
        if count > items.len() {
            return Err(RandomError::SampleTooLarge {
                requested: count,
                available: items.len(),
            });
        }
        let mut pool = items.to_vec();
        let len = pool.len();
        for i in 0..count {
            let j = i + self.below((len - i) as u64) as usize;
            pool.swap(i, j);
        }
        pool.truncate(count);
        Ok(pool)
    }
}

impl<R: SecureRandomSource + ?Sized> RandomExt for R {}

/// Production source backed by the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl SecureRandomSource for OsRandomSource {
    fn next_u64(&self) -> u64 {
        OsRng.next_u64()
    }
}

/// Reproducible source for simulations and tests. Never wire this into a live server.
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SecureRandomSource for SeededRandomSource {
    fn next_u64(&self) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.next_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of raw values.
    struct Scripted(Mutex<VecDeque<u64>>);

    impl Scripted {
        fn new(values: &[u64]) -> Self {
            Self(Mutex::new(values.iter().copied().collect()))
        }
    }

    impl SecureRandomSource for Scripted {
        fn next_u64(&self) -> u64 {
            self.0.lock().unwrap().pop_front().expect("script exhausted")
        }
    }

    #[test]
    fn test_uniform_range() {
        let rng = Scripted::new(&[0, u64::MAX]);
        assert_eq!(rng.uniform(), 0.0);
        let top = rng.uniform();
        assert!(top < 1.0 && top > 0.999_999);
    }

    #[test]
    fn test_bounded_int_rejects_biased_zone() {
        // bound 3: 2^64 mod 3 == 1, so u64::MAX is outside the accepted zone.
        let rng = Scripted::new(&[u64::MAX, 7]);
        assert_eq!(rng.bounded_int(10, 12).unwrap(), 10 + 7 % 3);
    }

    #[test]
    fn test_bounded_int_bounds() {
        let rng = SeededRandomSource::new(7);
        for _ in 0..10_000 {
            let v = rng.bounded_int(-3, 3).unwrap();
            assert!((-3..=3).contains(&v));
        }
        assert_eq!(rng.bounded_int(5, 5).unwrap(), 5);
        assert_eq!(
            rng.bounded_int(4, 3),
            Err(RandomError::InvalidRange { min: 4, max: 3 })
        );
        // full i64 span does not overflow
        rng.bounded_int(i64::MIN, i64::MAX).unwrap();
    }

    #[test]
    fn test_degenerate_weights_fail_loudly() {
        let rng = SeededRandomSource::new(1);
        assert_eq!(rng.weighted_index(&[]), Err(RandomError::Empty));
        assert_eq!(
            rng.weighted_index(&[0.0, 0.0]),
            Err(RandomError::ZeroTotalWeight)
        );
        assert_eq!(
            rng.weighted_index(&[1.0, -1.0]),
            Err(RandomError::InvalidWeight(1))
        );
        assert_eq!(
            rng.weighted_index(&[1.0, f64::NAN]),
            Err(RandomError::InvalidWeight(1))
        );
        assert_eq!(
            rng.weighted_choice(&["a"], &[1.0, 2.0]),
            Err(RandomError::LengthMismatch {
                items: 1,
                weights: 2
            })
        );
        assert_eq!(rng.chance(1.5), Err(RandomError::InvalidProbability(1.5)));
    }

    #[test]
    fn test_weighted_choice_frequencies_converge() {
        let rng = SeededRandomSource::new(42);
        let items = ["a", "b", "c", "d"];
        let weights = [1.0, 2.0, 3.0, 4.0];
        let n = 200_000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            let idx = rng.weighted_index(&weights).unwrap();
            counts[idx] += 1;
        }
        for (i, w) in weights.iter().enumerate() {
            let expected = w / 10.0;
            let observed = counts[i] as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.005,
                "{}: expected {expected}, observed {observed}",
                items[i]
            );
        }
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        // target lands exactly on a bucket boundary followed by zero weights
        let rng = SeededRandomSource::new(3);
        for _ in 0..1_000 {
            let idx = rng.weighted_index(&[0.0, 1.0, 0.0]).unwrap();
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn test_weighted_index_boundary_falls_back_to_last_positive() {
        // uniform() just below 1.0 scaled by the total lands in the last bucket
        let rng = Scripted::new(&[u64::MAX]);
        assert_eq!(rng.weighted_index(&[1.0, 1.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn test_shuffle_and_sample_are_permutations() {
        let rng = SeededRandomSource::new(9);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());

        let picked = rng.sample(&items, 10).unwrap();
        assert_eq!(picked.len(), 10);
        let mut dedup = picked.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), 10);
        assert!(rng.sample(&items, 51).is_err());
    }

    #[test]
    fn test_os_source_produces_values() {
        let rng: &dyn SecureRandomSource = &OsRandomSource;
        let a = rng.next_u64();
        let b = rng.next_u64();
        // two identical 64-bit draws from the OS CSPRNG are practically impossible
        assert_ne!(a, b);
        assert!(rng.chance(1.0).unwrap());
        assert!(!rng.chance(0.0).unwrap());
    }
}
