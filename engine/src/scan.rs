//! Block range, match budget and the per-block scan shared by every walker.

use std::sync::atomic::{AtomicU64, Ordering};

use chainwatch_client::ChainBlock;
use chainwatch_types::{Address, Transaction};

/// Inclusive block range, walked from `head` down to `lower`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanRange {
    pub head: u64,
    pub lower: u64,
}

impl ScanRange {
    pub fn new(head: u64, lower: u64) -> Self {
        Self { head, lower }
    }

    pub fn is_empty(&self) -> bool {
        self.head < self.lower
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.head - self.lower + 1
        }
    }

    /// Block numbers from `head` down to `lower`.
    pub fn descending(&self) -> impl Iterator<Item = u64> {
        let (lower, head) = (self.lower, self.head);
        (lower..=head).rev()
    }
}

/// How many more matches a scan may collect.
///
/// Seeded from the growth of the sender's transaction count. Consumption
/// saturates at zero, so concurrent scanners can race on it without
/// wrapping around.
#[derive(Debug)]
pub struct ScanBudget(AtomicU64);

impl ScanBudget {
    pub fn new(remaining: u64) -> Self {
        Self(AtomicU64::new(remaining))
    }

    pub fn remaining(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Take one unit. Returns false if none was left.
    pub fn try_consume(&self) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Scan one block newest transaction first, handing each match involving
/// `address` to `on_match` until the budget runs out. Returns the number of
/// matches.
pub fn scan_block(
    block: &ChainBlock,
    address: &Address,
    budget: &ScanBudget,
    mut on_match: impl FnMut(Transaction),
) -> usize {
    let mut matched = 0;
    for tx in block.transactions.iter().rev() {
        if budget.is_exhausted() {
            break;
        }
        if tx.involves(address) && budget.try_consume() {
            on_match(tx.clone());
            matched += 1;
        }
    }
    matched
}
