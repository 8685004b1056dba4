//! The discovery engine and the operations it exposes.

use std::sync::Arc;

use chainwatch_client::ChainClient;
use chainwatch_store::{SubscriberStore, TransactionCacheStore, WatermarkStore};
use chainwatch_types::{Address, Subscriber, Transaction};

use crate::{BlockWalker, EngineError, EngineMetrics, ScanRange, WalkContext};

/// The three operations every presentation surface dispatches to.
pub trait TransactionDiscovery: Send + Sync {
    /// Record `address` with the current head and its transaction count.
    fn subscribe(&self, address: &Address) -> Result<Subscriber, EngineError>;

    /// Highest block any scan has reached. [`EngineError::NotReady`] until
    /// the first scan touches the head.
    fn current_block(&self) -> Result<u64, EngineError>;

    /// Transactions involving `address` since it was subscribed.
    fn transactions(&self, address: &Address) -> Result<Vec<Transaction>, EngineError>;
}

/// Caching strategy, carrying the history cache when there is one.
#[derive(Clone)]
pub enum Caching {
    Releasing,
    Greedy(Arc<dyn TransactionCacheStore + Send + Sync>),
}

impl Caching {
    pub fn name(&self) -> &'static str {
        match self {
            Caching::Releasing => "releasing",
            Caching::Greedy(_) => "greedy",
        }
    }
}

/// Holds no state of its own: subscribers, the watermark and the history
/// cache live in the injected stores.
pub struct DiscoveryEngine {
    chain: Arc<dyn ChainClient>,
    subscribers: Arc<dyn SubscriberStore + Send + Sync>,
    watermark: Arc<dyn WatermarkStore + Send + Sync>,
    caching: Caching,
    walker: Box<dyn BlockWalker>,
    metrics: Arc<EngineMetrics>,
}

impl DiscoveryEngine {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        subscribers: Arc<dyn SubscriberStore + Send + Sync>,
        watermark: Arc<dyn WatermarkStore + Send + Sync>,
        caching: Caching,
        walker: Box<dyn BlockWalker>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            chain,
            subscribers,
            watermark,
            caching,
            walker,
            metrics,
        }
    }

    pub fn caching(&self) -> &'static str {
        self.caching.name()
    }

    pub fn execution(&self) -> &'static str {
        self.walker.name()
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Walk `range` for up to `remaining` matches. Nothing is fetched when
    /// either is empty.
    fn walk(
        &self,
        address: &Address,
        range: ScanRange,
        remaining: u64,
    ) -> Result<Vec<Transaction>, EngineError> {
        if remaining == 0 || range.is_empty() {
            return Ok(Vec::new());
        }
        let ctx = WalkContext {
            chain: self.chain.as_ref(),
            watermark: self.watermark.as_ref(),
            metrics: &self.metrics,
            address,
            range,
            remaining,
        };
        self.walker.walk(&ctx)
    }

    /// Merge a greedy scan into the cache.
    ///
    /// The cache is kept oldest-first, so the newest-first scan result is
    /// appended reversed. Matches already cached (the lower bound block is
    /// scanned again) are dropped first. Returns the full history, newest
    /// first, and how many of its entries are new.
    fn absorb(
        &self,
        cache: &(dyn TransactionCacheStore + Send + Sync),
        subscriber: &Subscriber,
        found: Vec<Transaction>,
    ) -> Result<(Vec<Transaction>, usize), EngineError> {
        let cached = cache.all_reversed(&subscriber.address)?;
        let fresh: Vec<Transaction> = found
            .into_iter()
            .filter(|tx| !cached.iter().any(|c| c.hash == tx.hash))
            .collect();

        if !fresh.is_empty() {
            let oldest_first: Vec<Transaction> = fresh.iter().rev().cloned().collect();
            cache.append(&subscriber.address, &oldest_first)?;
            self.subscribers.update(&subscriber.absorb(&fresh))?;
        }

        let discovered = fresh.len();
        let mut result = fresh;
        result.extend(cached);
        Ok((result, discovered))
    }
}

impl TransactionDiscovery for DiscoveryEngine {
    fn subscribe(&self, address: &Address) -> Result<Subscriber, EngineError> {
        let head = self
            .chain
            .head()
            .map_err(|e| EngineError::upstream("error getting current block number", e))?;
        let count = self.chain.tx_count_as_of(address, head)?;

        let subscriber = Subscriber::new(address.clone(), head, count);
        self.subscribers.create(&subscriber)?;

        self.metrics.subscriptions.inc();
        tracing::info!(%address, block = head, tx_count = count, "subscribed");
        Ok(subscriber)
    }

    fn current_block(&self) -> Result<u64, EngineError> {
        match self.watermark.current()? {
            0 => Err(EngineError::NotReady),
            block => Ok(block),
        }
    }

    fn transactions(&self, address: &Address) -> Result<Vec<Transaction>, EngineError> {
        let subscriber = self.subscribers.get(address)?;
        let head = self.chain.head()?;
        let current_count = self.chain.tx_count_as_of(address, head)?;
        let remaining = current_count.saturating_sub(subscriber.watermark_tx_count);

        let (lower, result, discovered) = match &self.caching {
            Caching::Releasing => {
                let lower = subscriber.watermark_block;
                let found = self.walk(address, ScanRange::new(head, lower), remaining)?;
                let discovered = found.len();
                (lower, found, discovered)
            }
            Caching::Greedy(cache) => {
                let lower = cache
                    .last_appended(address)?
                    .map_or(subscriber.watermark_block, |tx| {
                        tx.block_number.max(subscriber.watermark_block)
                    });
                let found = self.walk(address, ScanRange::new(head, lower), remaining)?;
                let (result, discovered) = self.absorb(cache.as_ref(), &subscriber, found)?;
                (lower, result, discovered)
            }
        };

        self.metrics.transactions_matched.inc_by(discovered as u64);
        tracing::info!(
            %address,
            head,
            lower,
            remaining,
            discovered,
            returned = result.len(),
            caching = self.caching.name(),
            execution = self.walker.name(),
            "transactions discovered"
        );
        Ok(result)
    }
}
