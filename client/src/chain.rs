//! The chain access seam.

use alloy_primitives::B256;
use chainwatch_types::{Address, Transaction};

use crate::ChainError;

/// A block with its full transaction objects, in on-chain order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainBlock {
    pub number: u64,
    pub hash: B256,
    pub transactions: Vec<Transaction>,
}

/// Read-only view of the chain.
///
/// Calls block the current thread; the engine drives them from worker
/// threads, never from an async executor.
pub trait ChainClient: Send + Sync {
    /// Number of the latest block.
    fn head(&self) -> Result<u64, ChainError>;

    /// Number of transactions `address` had sent as of block `block`.
    fn tx_count_as_of(&self, address: &Address, block: u64) -> Result<u64, ChainError>;

    /// Block `number` with full transactions.
    fn block_transactions(&self, number: u64) -> Result<ChainBlock, ChainError>;
}
