//! Chain access for chainwatch.
//!
//! [`ChainClient`] is the only way the discovery engine reads the chain.
//! [`JsonRpcClient`] implements it against an Ethereum-compatible JSON-RPC
//! node; tests substitute the nullable client from `chainwatch-nullables`.

pub mod chain;
pub mod error;
pub mod jsonrpc;
pub mod wire;

pub use chain::{ChainBlock, ChainClient};
pub use error::ChainError;
pub use jsonrpc::{ClientConfig, JsonRpcClient};
