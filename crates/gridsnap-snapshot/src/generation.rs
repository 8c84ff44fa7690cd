//! Process-wide snapshot generation counter.
//!
//! Lock-free and safe for concurrent access. Generation 0 is reserved for
//! the empty snapshot; captured snapshots start at 1.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Reserve the next generation number.
///
/// Every call returns a value strictly greater than all previous calls in
/// this process.
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_strictly_increase() {
        let a = next_generation();
        let b = next_generation();
        assert!(a >= 1);
        assert!(b > a);
    }

    #[test]
    fn concurrent_callers_never_share_a_generation() {
        let mut seen: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..100).map(|_| next_generation()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), total);
    }
}
