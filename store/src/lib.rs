//! Abstract storage traits for chainwatch.
//!
//! Every storage backend (in-memory, LMDB with record expiry) implements
//! these traits. The discovery engine depends only on the traits; the
//! strategy composer decides which backend is injected.

pub mod error;
pub mod subscriber;
pub mod tx_cache;
pub mod watermark;

pub use error::StoreError;
pub use subscriber::SubscriberStore;
pub use tx_cache::TransactionCacheStore;
pub use watermark::WatermarkStore;
