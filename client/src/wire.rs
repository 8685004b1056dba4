//! JSON-RPC envelopes and Ethereum response shapes.
//!
//! Quantities arrive as `0x`-prefixed hex strings and decode through the
//! `alloy-primitives` integer types.

use alloy_primitives::{Address as RawAddress, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

use chainwatch_types::Transaction;

use crate::ChainBlock;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// `eth_getBlockByNumber` result with `fullTransactions = true`.
#[derive(Debug, Deserialize)]
pub struct RpcBlock {
    pub number: U64,
    pub hash: B256,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// A transaction object as nodes return it inside a block.
///
/// Post-London transactions may omit `gasPrice` and typed transactions may
/// omit the legacy signature fields; both default to zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: B256,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<U64>,
    pub from: RawAddress,
    #[serde(default)]
    pub to: Option<RawAddress>,
    pub nonce: U64,
    pub gas: U256,
    #[serde(default)]
    pub gas_price: Option<U256>,
    pub value: U256,
    pub input: Bytes,
    #[serde(default)]
    pub v: U256,
    #[serde(default)]
    pub r: U256,
    #[serde(default)]
    pub s: U256,
    #[serde(default)]
    pub transaction_index: Option<U64>,
}

impl RpcTransaction {
    /// Convert into the domain record, filling block coordinates the node
    /// left out from the enclosing block.
    fn into_transaction(self, block_number: u64, block_hash: B256) -> Transaction {
        Transaction {
            hash: self.hash,
            block_hash: self.block_hash.unwrap_or(block_hash),
            block_number: self.block_number.map_or(block_number, |n| n.to::<u64>()),
            from: self.from.into(),
            to: self.to.map(Into::into),
            nonce: self.nonce.to::<u64>(),
            gas: self.gas,
            gas_price: self.gas_price.unwrap_or_default(),
            value: self.value,
            input: self.input,
            v: self.v,
            r: self.r,
            s: self.s,
            transaction_index: self.transaction_index.map_or(0, |i| i.to::<u64>()),
        }
    }
}

impl From<RpcBlock> for ChainBlock {
    fn from(block: RpcBlock) -> Self {
        let number = block.number.to::<u64>();
        let hash = block.hash;
        let transactions = block
            .transactions
            .into_iter()
            .map(|tx| tx.into_transaction(number, hash))
            .collect();
        ChainBlock {
            number,
            hash,
            transactions,
        }
    }
}

/// Block tag for a block number, e.g. `0x1b4`.
pub fn block_tag(number: u64) -> String {
    format!("{number:#x}")
}
