//! Prometheus metrics for the discovery engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks fetched successfully during scans.
    pub blocks_fetched: IntCounter,
    /// Block fetches that failed.
    pub block_failures: IntCounter,
    /// Transactions returned as new discoveries.
    pub transactions_matched: IntCounter,
    /// Successful subscriptions.
    pub subscriptions: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Highest block any scan has reached.
    pub watermark: IntGauge,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let blocks_fetched = register_int_counter_with_registry!(
            Opts::new("chainwatch_blocks_fetched_total", "Blocks fetched during scans"),
            registry
        )?;

        let block_failures = register_int_counter_with_registry!(
            Opts::new(
                "chainwatch_block_failures_total",
                "Block fetches that failed during scans"
            ),
            registry
        )?;

        let transactions_matched = register_int_counter_with_registry!(
            Opts::new(
                "chainwatch_transactions_matched_total",
                "Transactions discovered for subscribed addresses"
            ),
            registry
        )?;

        let subscriptions = register_int_counter_with_registry!(
            Opts::new("chainwatch_subscriptions_total", "Addresses subscribed"),
            registry
        )?;

        let watermark = register_int_gauge_with_registry!(
            Opts::new("chainwatch_watermark_block", "Highest block reached by any scan"),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_fetched,
            block_failures,
            transactions_matched,
            subscriptions,
            watermark,
        })
    }

    pub fn set_watermark(&self, block: u64) {
        self.watermark.set(i64::try_from(block).unwrap_or(i64::MAX));
    }

    /// Encode every metric in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
