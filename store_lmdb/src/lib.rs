//! LMDB storage backend for chainwatch.
//!
//! Implements every storage trait from `chainwatch-store` using the `heed`
//! LMDB bindings. Each logical store maps to one database within a single
//! environment. Records carry an expiry deadline: once it passes, the record
//! reads as absent and [`LmdbEnvironment::purge_expired`] reclaims it.

pub mod environment;
pub mod error;
pub mod record;
pub mod subscriber;
pub mod tx_cache;
pub mod watermark;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use record::{Expiring, TtlPolicy};
pub use subscriber::LmdbSubscriberStore;
pub use tx_cache::LmdbTxCacheStore;
pub use watermark::LmdbWatermarkStore;
