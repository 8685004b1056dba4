//! Binds a (caching, execution, backend) triple to an engine and its stores.

use std::sync::Arc;

use chainwatch_client::ChainClient;
use chainwatch_store::{SubscriberStore, TransactionCacheStore, WatermarkStore};
use chainwatch_store_lmdb::{LmdbEnvironment, TtlPolicy};
use chainwatch_store_memory::{AtomicWatermark, MemoryStore};
use chainwatch_types::{Clock, SystemClock};

use crate::{
    Backend, BlockWalker, Caching, CachingStrategy, ConcurrentWalker, DiscoveryEngine,
    EngineConfig, EngineError, EngineMetrics, ExecutionStrategy, SequentialWalker,
};

/// A composed engine plus the handles its owner may still need.
pub struct Composition {
    pub engine: Arc<DiscoveryEngine>,
    pub metrics: Arc<EngineMetrics>,
    /// Present for the ttl-store backend, for periodic expiry sweeps.
    pub ttl_env: Option<Arc<LmdbEnvironment>>,
}

struct Stores {
    subscribers: Arc<dyn SubscriberStore + Send + Sync>,
    watermark: Arc<dyn WatermarkStore + Send + Sync>,
    cache: Arc<dyn TransactionCacheStore + Send + Sync>,
    ttl_env: Option<Arc<LmdbEnvironment>>,
}

pub struct StrategyComposer {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl StrategyComposer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock used by the ttl-store backend to stamp and expire records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reject combinations with no implementation.
    ///
    /// Sequential pairs with either caching strategy on either backend.
    /// Concurrent pairs only with releasing on the memory backend: the
    /// greedy cache needs ordered appends, and the ttl-store serializes
    /// every write anyway.
    pub fn validate(
        caching: CachingStrategy,
        execution: ExecutionStrategy,
        backend: Backend,
    ) -> Result<(), EngineError> {
        match (caching, execution, backend) {
            (_, ExecutionStrategy::Sequential, _) => Ok(()),
            (CachingStrategy::Releasing, ExecutionStrategy::Concurrent, Backend::Memory) => Ok(()),
            (CachingStrategy::Greedy, ExecutionStrategy::Concurrent, _) => Err(EngineError::Config(
                "greedy caching cannot run with concurrent execution".into(),
            )),
            (c, e, b) => Err(EngineError::Config(format!(
                "unsupported combination: {c} caching, {e} execution, {b} backend"
            ))),
        }
    }

    /// Validate the triple, then build stores, walker and engine.
    /// Nothing is constructed for an invalid triple.
    pub fn compose(&self, chain: Arc<dyn ChainClient>) -> Result<Composition, EngineError> {
        let EngineConfig {
            caching,
            execution,
            backend,
            concurrency,
            ..
        } = self.config;
        Self::validate(caching, execution, backend)?;

        let walker: Box<dyn BlockWalker> = match execution {
            ExecutionStrategy::Sequential => Box::new(SequentialWalker),
            ExecutionStrategy::Concurrent => Box::new(ConcurrentWalker::new(concurrency)?),
        };

        let metrics = Arc::new(
            EngineMetrics::new()
                .map_err(|e| EngineError::Config(format!("failed to register metrics: {e}")))?,
        );

        let stores = self.build_stores(backend)?;
        let caching_impl = match caching {
            CachingStrategy::Releasing => Caching::Releasing,
            CachingStrategy::Greedy => Caching::Greedy(stores.cache),
        };

        let engine = DiscoveryEngine::new(
            chain,
            stores.subscribers,
            stores.watermark,
            caching_impl,
            walker,
            Arc::clone(&metrics),
        );

        tracing::info!(%caching, %execution, %backend, "discovery engine composed");
        Ok(Composition {
            engine: Arc::new(engine),
            metrics,
            ttl_env: stores.ttl_env,
        })
    }

    fn build_stores(&self, backend: Backend) -> Result<Stores, EngineError> {
        match backend {
            Backend::Memory => {
                let store = Arc::new(MemoryStore::new());
                Ok(Stores {
                    subscribers: store.clone(),
                    watermark: Arc::new(AtomicWatermark::new()),
                    cache: store,
                    ttl_env: None,
                })
            }
            Backend::TtlStore => {
                let cfg = &self.config.ttl_store;
                let policy = TtlPolicy::new(cfg.retention_secs, Arc::clone(&self.clock));
                let env = LmdbEnvironment::open(&cfg.path, cfg.map_size, policy).map_err(|e| {
                    EngineError::Config(format!(
                        "failed to open ttl store at {}: {e}",
                        cfg.path.display()
                    ))
                })?;
                Ok(Stores {
                    subscribers: Arc::new(env.subscriber_store()),
                    watermark: Arc::new(env.watermark_store()),
                    cache: Arc::new(env.tx_cache_store()),
                    ttl_env: Some(Arc::new(env)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_triples() {
        use Backend::*;
        use CachingStrategy::*;
        use ExecutionStrategy::*;

        for (c, e, b) in [
            (Releasing, Sequential, Memory),
            (Releasing, Sequential, TtlStore),
            (Greedy, Sequential, Memory),
            (Greedy, Sequential, TtlStore),
            (Releasing, Concurrent, Memory),
        ] {
            assert!(StrategyComposer::validate(c, e, b).is_ok(), "{c}/{e}/{b}");
        }
    }

    #[test]
    fn invalid_triples() {
        use Backend::*;
        use CachingStrategy::*;
        use ExecutionStrategy::*;

        for (c, e, b) in [
            (Greedy, Concurrent, Memory),
            (Greedy, Concurrent, TtlStore),
            (Releasing, Concurrent, TtlStore),
        ] {
            let err = StrategyComposer::validate(c, e, b).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "{c}/{e}/{b}");
        }
    }
}
