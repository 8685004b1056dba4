//! Immutable on-chain transaction record.

use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::Address;

/// One transaction as observed in a block.
///
/// Built only by converting chain client responses and never mutated
/// afterwards. Wide quantities (gas, prices, value, signature parts) keep
/// their full 256-bit width.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: B256,
    pub block_hash: B256,
    pub block_number: u64,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas: U256,
    pub gas_price: U256,
    pub value: U256,
    pub input: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
    pub transaction_index: u64,
}

impl Transaction {
    /// Whether `address` is the sender or the recipient.
    pub fn involves(&self, address: &Address) -> bool {
        &self.from == address || self.to.as_ref() == Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(from: &str, to: Option<&str>) -> Transaction {
        Transaction {
            hash: B256::repeat_byte(0x11),
            block_hash: B256::repeat_byte(0x22),
            block_number: 7,
            from: Address::parse(from).unwrap(),
            to: to.map(|t| Address::parse(t).unwrap()),
            nonce: 3,
            gas: U256::from(21_000u64),
            gas_price: U256::from(1_000_000_000u64),
            value: U256::from(10u64).pow(U256::from(18u64)),
            input: Bytes::new(),
            v: U256::from(27u64),
            r: U256::from(1u64),
            s: U256::from(2u64),
            transaction_index: 0,
        }
    }

    const A: &str = "0x00000000000000000000000000000000000000aa";
    const B: &str = "0x00000000000000000000000000000000000000bb";
    const C: &str = "0x00000000000000000000000000000000000000cc";

    #[test]
    fn involves_sender_and_recipient() {
        let tx = sample(A, Some(B));
        assert!(tx.involves(&Address::parse(A).unwrap()));
        assert!(tx.involves(&Address::parse(B).unwrap()));
        assert!(!tx.involves(&Address::parse(C).unwrap()));
    }

    #[test]
    fn contract_creation_matches_only_sender() {
        let tx = sample(A, None);
        assert!(tx.involves(&Address::parse(A).unwrap()));
        assert!(!tx.involves(&Address::parse(B).unwrap()));
    }

    #[test]
    fn json_uses_camel_case_and_hex_quantities() {
        let tx = sample(A, Some(B));
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["blockNumber"], 7);
        assert_eq!(json["transactionIndex"], 0);
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["to"], B);
    }

    #[test]
    fn bincode_roundtrip_preserves_record() {
        let tx = sample(A, Some(B));
        let encoded = bincode::serialize(&tx).unwrap();
        let decoded: Transaction = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, tx);
    }
}
