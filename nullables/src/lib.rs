//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (the chain node, the wall clock) sit behind traits.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;

pub use chain::NullChainClient;
pub use clock::NullClock;
