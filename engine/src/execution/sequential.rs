use chainwatch_types::Transaction;

use super::{BlockWalker, WalkContext};
use crate::{scan_block, EngineError, ScanBudget};

/// One block at a time, head first, stopping as soon as the budget is spent.
///
/// Results come back newest-first: descending block number, then descending
/// index within a block. The first failure aborts the scan.
#[derive(Debug, Default)]
pub struct SequentialWalker;

impl BlockWalker for SequentialWalker {
    fn walk(&self, ctx: &WalkContext<'_>) -> Result<Vec<Transaction>, EngineError> {
        let budget = ScanBudget::new(ctx.remaining);
        let mut found = Vec::new();

        for number in ctx.range.descending() {
            if budget.is_exhausted() {
                break;
            }
            let block = ctx.fetch_block(number)?;
            let matched = scan_block(&block, ctx.address, &budget, |tx| found.push(tx));
            tracing::debug!(block = number, matched, "scanned block");
        }

        Ok(found)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}
