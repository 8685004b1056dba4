//! HTTP surface for chainwatch.
//!
//! Exposes the three discovery operations plus a Prometheus scrape endpoint:
//! - `GET /get_current_block`
//! - `GET|POST /subscribe/{address}`
//! - `GET /get_transactions/{address}`
//! - `GET /metrics`

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use handlers::AppState;
pub use server::RpcServer;
