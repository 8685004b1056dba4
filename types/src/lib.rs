//! Fundamental types for chainwatch.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, the immutable transaction record, the per-address
//! subscriber watermark, and timestamps with an injectable clock.

pub mod address;
pub mod error;
pub mod subscriber;
pub mod time;
pub mod transaction;

pub use address::Address;
pub use error::TypesError;
pub use subscriber::Subscriber;
pub use time::{Clock, SystemClock, Timestamp};
pub use transaction::Transaction;
