//! # Car id sequence.
//!
//! [`SequenceGenerator`] hands out car ids `1, 2, 3, ...`. It is an atomic counter, so it
//! never shares a guard with [`LotState`](crate::LotState): the id is drawn first, then
//! the car is parked.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Concurrency-safe, strictly increasing id source starting at 1.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    last: AtomicU64,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next id; no two callers ever observe the same value.
    #[inline]
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, AtomicOrdering::Relaxed) + 1
    }

    /// Last id handed out (`0` before the first call).
    #[inline]
    pub fn last(&self) -> u64 {
        self.last.load(AtomicOrdering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_starts_at_one() {
        let seq = SequenceGenerator::new();
        assert_eq!(seq.last(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.next(), 2);
        assert_eq!(seq.last(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ids_are_unique_and_dense() {
        const M: u64 = 1_000;
        let seq = Arc::new(SequenceGenerator::new());

        let handles: Vec<_> = (0..M)
            .map(|_| {
                let seq = Arc::clone(&seq);
                tokio::spawn(async move { seq.next() })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for h in handles {
            assert!(ids.insert(h.await.unwrap()));
        }
        assert_eq!(ids, (1..=M).collect::<BTreeSet<u64>>());
    }
}
