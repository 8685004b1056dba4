//! Per-address transaction history cache, used by the greedy strategy.

use crate::StoreError;
use chainwatch_types::{Address, Transaction};

/// Append-only, insertion-ordered history per subscribed address.
///
/// Callers append oldest-first so that [`TransactionCacheStore::last_appended`]
/// is the newest cached transaction and [`TransactionCacheStore::all_reversed`]
/// comes back newest-first. Every method fails with [`StoreError::NotFound`]
/// for an address that is not subscribed.
pub trait TransactionCacheStore {
    /// Append `txs` in the given order.
    fn append(&self, address: &Address, txs: &[Transaction]) -> Result<(), StoreError>;

    /// The most recently appended transaction, if any.
    fn last_appended(&self, address: &Address) -> Result<Option<Transaction>, StoreError>;

    /// The full history in reverse insertion order.
    fn all_reversed(&self, address: &Address) -> Result<Vec<Transaction>, StoreError>;
}
