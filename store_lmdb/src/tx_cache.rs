//! LMDB implementation of TransactionCacheStore.
//!
//! Each address keeps its whole history in one record, so an append is a
//! read-modify-write inside a single write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use chainwatch_store::{StoreError, TransactionCacheStore};
use chainwatch_types::{Address, Subscriber, Transaction};

use crate::{LmdbError, TtlPolicy};

pub struct LmdbTxCacheStore {
    pub(crate) env: Arc<Env>,
    pub(crate) subscribers_db: Database<Bytes, Bytes>,
    pub(crate) histories_db: Database<Bytes, Bytes>,
    pub(crate) ttl: TtlPolicy,
}

impl LmdbTxCacheStore {
    /// The live history of a subscribed address. An expired history under a
    /// live subscriber reads as empty.
    fn history(&self, txn: &RoTxn, address: &Address) -> Result<Vec<Transaction>, LmdbError> {
        let key = address.as_str().as_bytes();
        let subscriber: Option<Subscriber> = self.ttl.read(&self.subscribers_db, txn, key)?;
        if subscriber.is_none() {
            return Err(LmdbError::NotFound(address.to_string()));
        }
        Ok(self.ttl.read(&self.histories_db, txn, key)?.unwrap_or_default())
    }
}

impl TransactionCacheStore for LmdbTxCacheStore {
    fn append(&self, address: &Address, txs: &[Transaction]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut history = self.history(&wtxn, address)?;
        history.extend_from_slice(txs);
        self.ttl
            .write(&self.histories_db, &mut wtxn, address.as_str().as_bytes(), &history)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(%address, appended = txs.len(), total = history.len(), "transactions cached");
        Ok(())
    }

    fn last_appended(&self, address: &Address) -> Result<Option<Transaction>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.history(&rtxn, address)?.pop())
    }

    fn all_reversed(&self, address: &Address) -> Result<Vec<Transaction>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut history = self.history(&rtxn, address)?;
        history.reverse();
        Ok(history)
    }
}
