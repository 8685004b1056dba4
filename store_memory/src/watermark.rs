//! Lock-free monotonic watermark.

use std::sync::atomic::{AtomicU64, Ordering};

use chainwatch_store::{StoreError, WatermarkStore};

/// Global block watermark held in a single atomic.
///
/// `advance_to` is a compare-and-swap retry loop: read the current value,
/// give up if the candidate is not higher, otherwise try to swap and retry
/// if another writer got there first.
#[derive(Debug, Default)]
pub struct AtomicWatermark {
    value: AtomicU64,
}

impl AtomicWatermark {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatermarkStore for AtomicWatermark {
    fn advance_to(&self, candidate: u64) -> Result<bool, StoreError> {
        let mut current = self.value.load(Ordering::Acquire);
        loop {
            if candidate <= current {
                return Ok(false);
            }
            match self.value.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::trace!(from = current, to = candidate, "watermark advanced");
                    return Ok(true);
                }
                Err(observed) => current = observed,
            }
        }
    }

    fn current(&self) -> Result<u64, StoreError> {
        Ok(self.value.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero() {
        assert_eq!(AtomicWatermark::new().current().unwrap(), 0);
    }

    #[test]
    fn only_higher_values_are_stored() {
        let wm = AtomicWatermark::new();
        assert!(wm.advance_to(10).unwrap());
        assert!(!wm.advance_to(7).unwrap());
        assert!(!wm.advance_to(10).unwrap());
        assert_eq!(wm.current().unwrap(), 10);
    }

    #[test]
    fn concurrent_writers_keep_the_maximum() {
        let wm = Arc::new(AtomicWatermark::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let wm = Arc::clone(&wm);
                std::thread::spawn(move || {
                    for i in 0..1_000u64 {
                        wm.advance_to(i * 8 + t).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(wm.current().unwrap(), 999 * 8 + 7);
    }

    proptest! {
        #[test]
        fn current_is_max_of_all_candidates(candidates in prop::collection::vec(any::<u64>(), 0..64)) {
            let wm = AtomicWatermark::new();
            for c in &candidates {
                wm.advance_to(*c).unwrap();
            }
            let expected = candidates.iter().copied().max().unwrap_or(0);
            prop_assert_eq!(wm.current().unwrap(), expected);
        }
    }
}
