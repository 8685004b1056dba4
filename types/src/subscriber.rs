//! Per-address subscription record.

use serde::{Deserialize, Serialize};

use crate::{Address, Transaction};

/// A subscribed address together with its watermark.
///
/// The watermark is the block number and outgoing transaction count observed
/// when the address was subscribed, or when the incremental cache last
/// absorbed new transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub address: Address,
    pub watermark_block: u64,
    pub watermark_tx_count: u64,
}

impl Subscriber {
    pub fn new(address: Address, watermark_block: u64, watermark_tx_count: u64) -> Self {
        Self {
            address,
            watermark_block,
            watermark_tx_count,
        }
    }

    /// Watermark after absorbing a batch of newly discovered transactions.
    ///
    /// The block moves to the newest transaction in the batch (never
    /// backwards) and the count grows by the batch length.
    pub fn absorb(&self, batch: &[Transaction]) -> Self {
        let newest = batch
            .iter()
            .map(|tx| tx.block_number)
            .max()
            .unwrap_or(self.watermark_block);

        Self {
            address: self.address.clone(),
            watermark_block: self.watermark_block.max(newest),
            watermark_tx_count: self.watermark_tx_count.saturating_add(batch.len() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, B256, U256};

    fn address() -> Address {
        Address::parse("0x00000000000000000000000000000000000000aa").unwrap()
    }

    fn tx_at(block_number: u64) -> Transaction {
        Transaction {
            hash: B256::with_last_byte(block_number as u8),
            block_hash: B256::ZERO,
            block_number,
            from: address(),
            to: None,
            nonce: 0,
            gas: U256::ZERO,
            gas_price: U256::ZERO,
            value: U256::ZERO,
            input: Bytes::new(),
            v: U256::ZERO,
            r: U256::ZERO,
            s: U256::ZERO,
            transaction_index: 0,
        }
    }

    #[test]
    fn absorb_moves_to_newest_block() {
        let sub = Subscriber::new(address(), 5, 2);
        let next = sub.absorb(&[tx_at(9), tx_at(7), tx_at(6)]);
        assert_eq!(next.watermark_block, 9);
        assert_eq!(next.watermark_tx_count, 5);
    }

    #[test]
    fn absorb_empty_batch_is_identity() {
        let sub = Subscriber::new(address(), 5, 2);
        assert_eq!(sub.absorb(&[]), sub);
    }

    #[test]
    fn absorb_never_moves_backwards() {
        let sub = Subscriber::new(address(), 12, 0);
        assert_eq!(sub.absorb(&[tx_at(3)]).watermark_block, 12);
    }
}
