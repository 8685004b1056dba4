//! LMDB implementation of WatermarkStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use chainwatch_store::{StoreError, WatermarkStore};

use crate::{LmdbError, TtlPolicy};

const WATERMARK_KEY: &[u8] = b"current_block";

/// The watermark lives in the meta database. LMDB admits one write
/// transaction at a time, so the compare and the store in
/// [`WatermarkStore::advance_to`] cannot interleave with another writer.
pub struct LmdbWatermarkStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) ttl: TtlPolicy,
}

impl WatermarkStore for LmdbWatermarkStore {
    fn advance_to(&self, candidate: u64) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let current: u64 = self
            .ttl
            .read(&self.meta_db, &wtxn, WATERMARK_KEY)?
            .unwrap_or(0);
        if candidate <= current {
            return Ok(false);
        }
        self.ttl.write(&self.meta_db, &mut wtxn, WATERMARK_KEY, &candidate)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn current(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let current = self.ttl.read(&self.meta_db, &rtxn, WATERMARK_KEY)?;
        Ok(current.unwrap_or(0))
    }
}
