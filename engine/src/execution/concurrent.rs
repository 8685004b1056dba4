use std::sync::mpsc;
use std::sync::Mutex;

use rayon::{ThreadPool, ThreadPoolBuilder};

use chainwatch_types::Transaction;

use super::{BlockWalker, WalkContext};
use crate::{scan_block, EngineError, ScanBudget};

/// One task per block on a fixed-width worker pool.
///
/// Every block in the range is fetched; the shared budget only gates the
/// in-block scan, so a task that starts after the budget ran out fetches
/// its block and collects nothing. Result order is unspecified. Any block
/// failure fails the whole scan and partial results are dropped.
pub struct ConcurrentWalker {
    pool: ThreadPool,
}

impl ConcurrentWalker {
    pub fn new(width: usize) -> Result<Self, EngineError> {
        if width == 0 {
            return Err(EngineError::Config("concurrency must be at least 1".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("chainwatch-scan-{i}"))
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build scan pool: {e}")))?;
        Ok(Self { pool })
    }
}

impl BlockWalker for ConcurrentWalker {
    fn walk(&self, ctx: &WalkContext<'_>) -> Result<Vec<Transaction>, EngineError> {
        let task_count = usize::try_from(ctx.range.len())
            .map_err(|_| EngineError::Validation(format!("scan range too large: {:?}", ctx.range)))?;

        let budget = ScanBudget::new(ctx.remaining);
        let found = Mutex::new(Vec::new());
        let (errors_tx, errors_rx) = mpsc::sync_channel::<EngineError>(task_count);

        let (shared_budget, shared_found) = (&budget, &found);
        self.pool.scope(move |scope| {
            for number in ctx.range.descending() {
                let errors_tx = errors_tx.clone();
                scope.spawn(move |_| {
                    let block = match ctx.fetch_block(number) {
                        Ok(block) => block,
                        Err(e) => {
                            tracing::warn!(block = number, error = %e, "block scan failed");
                            // capacity equals the task count, so this never blocks
                            let _ = errors_tx.send(e);
                            return;
                        }
                    };
                    let matched = scan_block(&block, ctx.address, shared_budget, |tx| {
                        shared_found
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .push(tx);
                    });
                    tracing::debug!(block = number, matched, "scanned block");
                });
            }
            // the last sender goes out of scope here
        });

        let errors: Vec<EngineError> = errors_rx.try_iter().collect();
        if !errors.is_empty() {
            return Err(EngineError::Aggregated(errors));
        }
        Ok(found.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn name(&self) -> &'static str {
        "concurrent"
    }
}
