//! LMDB implementation of SubscriberStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use chainwatch_store::{StoreError, SubscriberStore};
use chainwatch_types::{Address, Subscriber, Transaction};

use crate::{LmdbError, TtlPolicy};

pub struct LmdbSubscriberStore {
    pub(crate) env: Arc<Env>,
    pub(crate) subscribers_db: Database<Bytes, Bytes>,
    pub(crate) histories_db: Database<Bytes, Bytes>,
    pub(crate) ttl: TtlPolicy,
}

impl SubscriberStore for LmdbSubscriberStore {
    fn create(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let key = subscriber.address.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let existing: Option<Subscriber> = self.ttl.read(&self.subscribers_db, &wtxn, key)?;
        if existing.is_some() {
            return Err(LmdbError::Conflict(subscriber.address.to_string()).into());
        }

        self.ttl.write(&self.subscribers_db, &mut wtxn, key, subscriber)?;
        self.ttl
            .write(&self.histories_db, &mut wtxn, key, &Vec::<Transaction>::new())?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get(&self, address: &Address) -> Result<Subscriber, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let subscriber = self
            .ttl
            .read(&self.subscribers_db, &rtxn, address.as_str().as_bytes())?
            .ok_or_else(|| LmdbError::NotFound(address.to_string()))?;
        Ok(subscriber)
    }

    fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let key = subscriber.address.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let existing: Option<Subscriber> = self.ttl.read(&self.subscribers_db, &wtxn, key)?;
        if existing.is_none() {
            return Err(LmdbError::NotFound(subscriber.address.to_string()).into());
        }

        self.ttl.write(&self.subscribers_db, &mut wtxn, key, subscriber)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
