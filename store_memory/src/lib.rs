//! In-memory storage backend for chainwatch.
//!
//! Implements every storage trait from `chainwatch-store` on plain maps
//! behind `RwLock`s, plus an atomic watermark. Nothing survives the process
//! and nothing expires.

pub mod store;
pub mod watermark;

pub use store::MemoryStore;
pub use watermark::AtomicWatermark;
