//! Ethereum JSON-RPC client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::U64;
use serde::de::DeserializeOwned;
use serde_json::json;

use chainwatch_types::Address;

use crate::wire::{block_tag, RpcBlock, RpcRequest, RpcResponse};
use crate::{ChainBlock, ChainClient, ChainError};

/// Default timeout for a single request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
const ETH_GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Node endpoint, e.g. `https://cloudflare-eth.com`.
    pub url: String,
    /// Value sent in the `jsonrpc` field of every request.
    pub jsonrpc_version: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            jsonrpc_version: "2.0".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Blocking JSON-RPC client.
///
/// Request ids come from a shared counter, so one client can be used from
/// many worker threads at once. Must not be created or dropped inside an
/// async runtime.
pub struct JsonRpcClient {
    http: reqwest::blocking::Client,
    url: String,
    jsonrpc_version: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(config: ClientConfig) -> Result<Self, ChainError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: config.url,
            jsonrpc_version: config.jsonrpc_version,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one request and decode its `result`.
    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: &self.jsonrpc_version,
            method,
            params,
            id,
        };

        let response = self.http.post(&self.url).json(&request).send().map_err(|e| {
            if e.is_timeout() {
                ChainError::Transport(format!("{method} timed out: {e}"))
            } else if e.is_connect() {
                ChainError::Transport(format!("connection failed: {e}"))
            } else {
                ChainError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ChainError::Transport(format!("failed to read {method} response: {e}")))?;

        if !status.is_success() {
            return Err(ChainError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ChainError::Decode(format!("{method}: {e}")))?;

        if let Some(error) = envelope.error.filter(|e| !e.message.is_empty()) {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        tracing::trace!(method, id, "rpc call completed");
        envelope
            .result
            .ok_or_else(|| ChainError::MissingResult(method.to_string()))
    }
}

impl ChainClient for JsonRpcClient {
    fn head(&self) -> Result<u64, ChainError> {
        let number: U64 = self.call(ETH_BLOCK_NUMBER, json!([]))?;
        Ok(number.to::<u64>())
    }

    fn tx_count_as_of(&self, address: &Address, block: u64) -> Result<u64, ChainError> {
        let count: U64 = self.call(
            ETH_GET_TRANSACTION_COUNT,
            json!([address.as_str(), block_tag(block)]),
        )?;
        Ok(count.to::<u64>())
    }

    fn block_transactions(&self, number: u64) -> Result<ChainBlock, ChainError> {
        let block: RpcBlock = self.call(ETH_GET_BLOCK_BY_NUMBER, json!([block_tag(number), true]))?;
        Ok(block.into())
    }
}
