//! Shared utilities for chainwatch.

pub mod logging;

pub use logging::{init_logging, LogFormat};
