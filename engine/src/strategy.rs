//! Strategy selectors and the composer's input.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// What happens to discovered transactions after a call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachingStrategy {
    /// Discard everything; rescan from the subscription block every call.
    #[default]
    Releasing,
    /// Cache discoveries and resume from the newest cached block.
    Greedy,
}

/// How blocks in the scan range are fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    Concurrent,
}

/// Which storage implementation backs the stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Memory,
    /// LMDB with per-record expiry.
    TtlStore,
}

impl CachingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CachingStrategy::Releasing => "releasing",
            CachingStrategy::Greedy => "greedy",
        }
    }
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Sequential => "sequential",
            ExecutionStrategy::Concurrent => "concurrent",
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::TtlStore => "ttl-store",
        }
    }
}

macro_rules! impl_name_traits {
    ($ty:ty, $what:literal, [$($variant:expr),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| EngineError::Config(format!("unknown {} '{}'", $what, s)))
            }
        }
    };
}

impl_name_traits!(CachingStrategy, "caching strategy", [CachingStrategy::Releasing, CachingStrategy::Greedy]);
impl_name_traits!(ExecutionStrategy, "execution strategy", [ExecutionStrategy::Sequential, ExecutionStrategy::Concurrent]);
impl_name_traits!(Backend, "storage backend", [Backend::Memory, Backend::TtlStore]);

/// Parameters of the LMDB backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlStoreConfig {
    #[serde(default = "default_ttl_path")]
    pub path: PathBuf,
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    /// How long records stay visible after their last write. Zero disables
    /// expiry.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for TtlStoreConfig {
    fn default() -> Self {
        Self {
            path: default_ttl_path(),
            map_size: default_map_size(),
            retention_secs: default_retention_secs(),
        }
    }
}

/// Everything the composer needs to pick strategies and build stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub caching: CachingStrategy,
    #[serde(default)]
    pub execution: ExecutionStrategy,
    #[serde(default)]
    pub backend: Backend,
    /// Worker pool width for the concurrent strategy.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub ttl_store: TtlStoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            caching: CachingStrategy::default(),
            execution: ExecutionStrategy::default(),
            backend: Backend::default(),
            concurrency: default_concurrency(),
            ttl_store: TtlStoreConfig::default(),
        }
    }
}

fn default_ttl_path() -> PathBuf {
    PathBuf::from("data/chainwatch")
}

fn default_map_size() -> usize {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_concurrency() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        assert_eq!("greedy".parse::<CachingStrategy>().unwrap(), CachingStrategy::Greedy);
        assert_eq!(" Concurrent ".parse::<ExecutionStrategy>().unwrap(), ExecutionStrategy::Concurrent);
        assert_eq!("ttl-store".parse::<Backend>().unwrap(), Backend::TtlStore);
        assert_eq!(Backend::TtlStore.to_string(), "ttl-store");
    }

    #[test]
    fn unknown_name_is_config_error() {
        let err = "redis".parse::<Backend>().unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn toml_uses_lowercase_names_and_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            caching = "greedy"
            backend = "ttl-store"

            [ttl_store]
            retention_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.caching, CachingStrategy::Greedy);
        assert_eq!(config.execution, ExecutionStrategy::Sequential);
        assert_eq!(config.backend, Backend::TtlStore);
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.ttl_store.retention_secs, 60);
        assert_eq!(config.ttl_store.map_size, 1024 * 1024 * 1024);
    }

    #[test]
    fn toml_rejects_unknown_strategy() {
        assert!(toml::from_str::<EngineConfig>(r#"execution = "async""#).is_err());
    }
}
