//! Daemon configuration, read from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! memory-backed, releasing, sequential engine pointed at a local node.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chainwatch_client::ClientConfig;
use chainwatch_engine::{EngineConfig, TtlStoreConfig};
use chainwatch_utils::LogFormat;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: ChainSection,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Takes precedence over an `[engine.ttl_store]` table when present.
    #[serde(default)]
    pub ttl_store: Option<TtlStoreConfig>,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub maintenance: MaintenanceSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSection {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Serve `/metrics`.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceSection {
    /// Seconds between expiry sweeps of the ttl store.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid configuration")
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("in {}", path.display()))
    }

    /// The composer's input, with a top-level `[ttl_store]` folded in.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ttl_store: self.ttl_store_config().clone(),
            ..self.engine.clone()
        }
    }

    /// The ttl-store settings in effect: the top-level table if given,
    /// otherwise `[engine.ttl_store]`.
    pub fn ttl_store_config(&self) -> &TtlStoreConfig {
        self.ttl_store.as_ref().unwrap_or(&self.engine.ttl_store)
    }

    pub fn ttl_store_config_mut(&mut self) -> &mut TtlStoreConfig {
        match &mut self.ttl_store {
            Some(top_level) => top_level,
            None => &mut self.engine.ttl_store,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.chain.rpc_url.clone(),
            jsonrpc_version: self.chain.jsonrpc_version.clone(),
            timeout: Duration::from_secs(self.chain.timeout_secs),
        }
    }
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            jsonrpc_version: default_jsonrpc_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics: default_true(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

impl Default for MaintenanceSection {
    fn default() -> Self {
        Self {
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".into()
}

fn default_jsonrpc_version() -> String {
    "2.0".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

fn default_purge_interval_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_engine::{Backend, CachingStrategy, ExecutionStrategy};

    #[test]
    fn empty_file_is_all_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.http.listen.port(), 8080);
        assert_eq!(config.engine.caching, CachingStrategy::Releasing);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [chain]
            rpc_url = "https://node.example:8545"
            timeout_secs = 5

            [engine]
            caching = "greedy"
            backend = "ttl-store"

            [ttl_store]
            path = "/var/lib/chainwatch"
            retention_secs = 3600

            [http]
            listen = "0.0.0.0:9000"

            [logging]
            format = "json"
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.chain.jsonrpc_version, "2.0");
        assert_eq!(config.client_config().timeout, Duration::from_secs(5));
        assert_eq!(config.http.listen.port(), 9000);
        assert_eq!(config.logging.format, LogFormat::Json);

        let engine = config.engine_config();
        assert_eq!(engine.caching, CachingStrategy::Greedy);
        assert_eq!(engine.execution, ExecutionStrategy::Sequential);
        assert_eq!(engine.backend, Backend::TtlStore);
        assert_eq!(engine.ttl_store.retention_secs, 3600);
        assert_eq!(engine.ttl_store.path, Path::new("/var/lib/chainwatch"));
    }

    #[test]
    fn nested_ttl_store_table_is_honored() {
        let config = AppConfig::from_toml_str(
            r#"
            [engine]
            backend = "ttl-store"

            [engine.ttl_store]
            retention_secs = 5
            path = "/srv/chainwatch"
            "#,
        )
        .unwrap();

        let engine = config.engine_config();
        assert_eq!(engine.ttl_store.retention_secs, 5);
        assert_eq!(engine.ttl_store.path, Path::new("/srv/chainwatch"));
    }

    #[test]
    fn top_level_ttl_store_wins_over_nested() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [engine.ttl_store]
            retention_secs = 5

            [ttl_store]
            retention_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.engine_config().ttl_store.retention_secs, 60);

        config.ttl_store_config_mut().retention_secs = 90;
        assert_eq!(config.engine_config().ttl_store.retention_secs, 90);
        assert_eq!(config.engine.ttl_store.retention_secs, 5);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = AppConfig::from_toml_str("[engine]\nexecution = \"parallel\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("parallel"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::from_toml_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
