//! Transaction discovery engine for chainwatch.
//!
//! Reconstructs the transaction history of a subscribed address by walking
//! blocks backward from the chain head, using the sender's transaction count
//! as the stopping signal. Two caching strategies (releasing, greedy) combine
//! with two execution strategies (sequential, concurrent); the
//! [`StrategyComposer`] binds a valid combination to a storage backend.

pub mod composer;
pub mod engine;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod scan;
pub mod strategy;

pub use composer::{Composition, StrategyComposer};
pub use engine::{Caching, DiscoveryEngine, TransactionDiscovery};
pub use error::{EngineError, ErrorKind};
pub use execution::{BlockWalker, ConcurrentWalker, SequentialWalker, WalkContext};
pub use metrics::EngineMetrics;
pub use scan::{scan_block, ScanBudget, ScanRange};
pub use strategy::{Backend, CachingStrategy, EngineConfig, ExecutionStrategy, TtlStoreConfig};
