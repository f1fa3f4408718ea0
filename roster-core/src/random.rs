//! Injected randomness.
//!
//! Selection never touches a global generator directly; it goes through
//! `RandomSource` so tests can supply a fixed sequence and assert exact
//! outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// A source of uniformly distributed indices.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `[0, n)`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero. Callers must check for an empty candidate
    /// pool before drawing.
    fn index(&self, n: usize) -> usize;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, n: usize) -> usize {
        rand::rng().random_range(0..n)
    }
}

/// Replays a fixed sequence of indices, wrapping around when exhausted.
/// Each value is taken modulo the requested bound, so a sequence of
/// zeros always picks the first remaining candidate.
#[derive(Debug)]
pub struct SequenceRandom {
    sequence: Vec<usize>,
    position: AtomicUsize,
}

impl SequenceRandom {
    pub fn new(sequence: Vec<usize>) -> Self {
        assert!(!sequence.is_empty(), "sequence must not be empty");
        Self {
            sequence,
            position: AtomicUsize::new(0),
        }
    }

    /// A source that always picks index 0.
    pub fn zeroes() -> Self {
        Self::new(vec![0])
    }
}

impl RandomSource for SequenceRandom {
    fn index(&self, n: usize) -> usize {
        assert!(n > 0, "cannot draw an index from an empty range");
        let pos = self.position.fetch_add(1, Ordering::Relaxed);
        self.sequence[pos % self.sequence.len()] % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_bounds() {
        let source = ThreadRandom;
        for _ in 0..1000 {
            assert!(source.index(3) < 3);
        }
    }

    #[test]
    fn sequence_random_replays_and_wraps() {
        let source = SequenceRandom::new(vec![2, 0, 1]);
        assert_eq!(source.index(5), 2);
        assert_eq!(source.index(5), 0);
        assert_eq!(source.index(5), 1);
        // wrapped
        assert_eq!(source.index(5), 2);
    }

    #[test]
    fn sequence_random_reduces_modulo_bound() {
        let source = SequenceRandom::new(vec![7]);
        assert_eq!(source.index(3), 1);
    }
}
