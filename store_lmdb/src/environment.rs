//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::record::{deadline_of, TtlPolicy};
use crate::{LmdbError, LmdbSubscriberStore, LmdbTxCacheStore, LmdbWatermarkStore};

const SUBSCRIBERS_DB: &str = "subscribers";
const HISTORIES_DB: &str = "histories";
const META_DB: &str = "meta";
const MAX_DBS: u32 = 3;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    subscribers_db: Database<Bytes, Bytes>,
    histories_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
    ttl: TtlPolicy,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize, ttl: TtlPolicy) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: each path is opened once per process; the composer owns the
        // only environment handle and hands out clones of the Arc.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let subscribers_db = env.create_database(&mut wtxn, Some(SUBSCRIBERS_DB))?;
        let histories_db = env.create_database(&mut wtxn, Some(HISTORIES_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        tracing::info!(
            path = %path.display(),
            map_size,
            retention_secs = ttl.retention_secs(),
            "opened LMDB environment"
        );

        Ok(Self {
            env: Arc::new(env),
            subscribers_db,
            histories_db,
            meta_db,
            ttl,
        })
    }

    pub fn subscriber_store(&self) -> LmdbSubscriberStore {
        LmdbSubscriberStore {
            env: Arc::clone(&self.env),
            subscribers_db: self.subscribers_db,
            histories_db: self.histories_db,
            ttl: self.ttl.clone(),
        }
    }

    pub fn tx_cache_store(&self) -> LmdbTxCacheStore {
        LmdbTxCacheStore {
            env: Arc::clone(&self.env),
            subscribers_db: self.subscribers_db,
            histories_db: self.histories_db,
            ttl: self.ttl.clone(),
        }
    }

    pub fn watermark_store(&self) -> LmdbWatermarkStore {
        LmdbWatermarkStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
            ttl: self.ttl.clone(),
        }
    }

    /// Delete every record whose deadline has passed. Returns how many
    /// records were removed.
    pub fn purge_expired(&self) -> Result<usize, LmdbError> {
        let now = self.ttl.now();
        let mut wtxn = self.env.write_txn()?;
        let mut purged = 0;

        for db in [&self.subscribers_db, &self.histories_db, &self.meta_db] {
            let mut expired = Vec::new();
            for entry in db.iter(&wtxn)? {
                let (key, value) = entry?;
                if deadline_of(value)?.is_some_and(|deadline| deadline.is_reached(now)) {
                    expired.push(key.to_vec());
                }
            }
            for key in &expired {
                db.delete(&mut wtxn, key)?;
            }
            purged += expired.len();
        }

        wtxn.commit()?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired records");
        }
        Ok(purged)
    }
}
