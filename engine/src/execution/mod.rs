//! Execution strategies: how the blocks of a scan range get fetched.

mod concurrent;
mod sequential;

pub use concurrent::ConcurrentWalker;
pub use sequential::SequentialWalker;

use chainwatch_client::{ChainBlock, ChainClient};
use chainwatch_store::WatermarkStore;
use chainwatch_types::{Address, Transaction};

use crate::{EngineError, EngineMetrics, ScanRange};

/// Everything one scan needs, borrowed from the engine for its duration.
pub struct WalkContext<'a> {
    pub chain: &'a dyn ChainClient,
    pub watermark: &'a (dyn WatermarkStore + Send + Sync),
    pub metrics: &'a EngineMetrics,
    pub address: &'a Address,
    pub range: ScanRange,
    /// Match budget for this scan.
    pub remaining: u64,
}

impl WalkContext<'_> {
    /// Fetch one block, recording it, and raise the global watermark when the
    /// block is the head of the range.
    pub fn fetch_block(&self, number: u64) -> Result<ChainBlock, EngineError> {
        let block = match self.chain.block_transactions(number) {
            Ok(block) => block,
            Err(e) => {
                self.metrics.block_failures.inc();
                return Err(EngineError::upstream(format!("failed to fetch block {number}"), e));
            }
        };
        self.metrics.blocks_fetched.inc();

        if number == self.range.head && self.watermark.advance_to(number)? {
            self.metrics.set_watermark(number);
        }
        Ok(block)
    }
}

/// Walks a scan range and returns the matches it found.
pub trait BlockWalker: Send + Sync {
    fn walk(&self, ctx: &WalkContext<'_>) -> Result<Vec<Transaction>, EngineError>;

    fn name(&self) -> &'static str;
}
