//! Map-backed subscriber and transaction cache store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chainwatch_store::{StoreError, SubscriberStore, TransactionCacheStore};
use chainwatch_types::{Address, Subscriber, Transaction};

/// In-memory subscriber records and per-address transaction histories.
///
/// Subscribers and histories sit behind separate locks, so a cache append
/// never blocks a concurrent subscriber lookup for long.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscribers: RwLock<HashMap<Address, Subscriber>>,
    histories: RwLock<HashMap<Address, Vec<Transaction>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribed addresses.
    pub fn subscriber_count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.subscribers)?.len())
    }

    fn ensure_subscribed(&self, address: &Address) -> Result<(), StoreError> {
        if read(&self.subscribers)?.contains_key(address) {
            Ok(())
        } else {
            Err(StoreError::NotFound(address.to_string()))
        }
    }
}

impl SubscriberStore for MemoryStore {
    fn create(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut subscribers = write(&self.subscribers)?;
        if subscribers.contains_key(&subscriber.address) {
            return Err(StoreError::Conflict(subscriber.address.to_string()));
        }
        subscribers.insert(subscriber.address.clone(), subscriber.clone());
        write(&self.histories)?.insert(subscriber.address.clone(), Vec::new());
        Ok(())
    }

    fn get(&self, address: &Address) -> Result<Subscriber, StoreError> {
        read(&self.subscribers)?
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut subscribers = write(&self.subscribers)?;
        match subscribers.get_mut(&subscriber.address) {
            Some(slot) => {
                *slot = subscriber.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(subscriber.address.to_string())),
        }
    }
}

impl TransactionCacheStore for MemoryStore {
    fn append(&self, address: &Address, txs: &[Transaction]) -> Result<(), StoreError> {
        self.ensure_subscribed(address)?;
        write(&self.histories)?
            .entry(address.clone())
            .or_default()
            .extend_from_slice(txs);
        tracing::debug!(%address, appended = txs.len(), "transactions cached");
        Ok(())
    }

    fn last_appended(&self, address: &Address) -> Result<Option<Transaction>, StoreError> {
        self.ensure_subscribed(address)?;
        Ok(read(&self.histories)?
            .get(address)
            .and_then(|txs| txs.last())
            .cloned())
    }

    fn all_reversed(&self, address: &Address) -> Result<Vec<Transaction>, StoreError> {
        self.ensure_subscribed(address)?;
        Ok(read(&self.histories)?
            .get(address)
            .map(|txs| txs.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, B256, U256};
    use proptest::prelude::*;

    fn address(last: u8) -> Address {
        Address::parse(&format!("0x{}{:02x}", "0".repeat(38), last)).unwrap()
    }

    fn tx(block_number: u64, index: u64) -> Transaction {
        Transaction {
            hash: B256::from(U256::from(block_number * 1_000 + index)),
            block_hash: B256::from(U256::from(block_number)),
            block_number,
            from: address(1),
            to: Some(address(2)),
            nonce: index,
            gas: U256::from(21_000u64),
            gas_price: U256::ZERO,
            value: U256::ZERO,
            input: Bytes::new(),
            v: U256::ZERO,
            r: U256::ZERO,
            s: U256::ZERO,
            transaction_index: index,
        }
    }

    #[test]
    fn create_then_get() {
        let store = MemoryStore::new();
        let sub = Subscriber::new(address(1), 10, 4);
        store.create(&sub).unwrap();
        assert_eq!(store.get(&address(1)).unwrap(), sub);
        assert_eq!(store.subscriber_count().unwrap(), 1);
    }

    #[test]
    fn duplicate_create_conflicts() {
        let store = MemoryStore::new();
        store.create(&Subscriber::new(address(1), 10, 4)).unwrap();
        let err = store.create(&Subscriber::new(address(1), 11, 5)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get(&address(1)).unwrap().watermark_block, 10);
    }

    #[test]
    fn get_unknown_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.get(&address(9)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn update_requires_existing_subscriber() {
        let store = MemoryStore::new();
        let err = store.update(&Subscriber::new(address(1), 1, 1)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.create(&Subscriber::new(address(1), 1, 1)).unwrap();
        store.update(&Subscriber::new(address(1), 8, 3)).unwrap();
        assert_eq!(store.get(&address(1)).unwrap().watermark_tx_count, 3);
    }

    #[test]
    fn cache_operations_require_subscription() {
        let store = MemoryStore::new();
        assert!(matches!(store.append(&address(1), &[tx(1, 0)]), Err(StoreError::NotFound(_))));
        assert!(matches!(store.last_appended(&address(1)), Err(StoreError::NotFound(_))));
        assert!(matches!(store.all_reversed(&address(1)), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn last_appended_tracks_newest_insert() {
        let store = MemoryStore::new();
        store.create(&Subscriber::new(address(1), 0, 0)).unwrap();
        assert_eq!(store.last_appended(&address(1)).unwrap(), None);

        store.append(&address(1), &[tx(3, 0), tx(4, 1)]).unwrap();
        store.append(&address(1), &[tx(6, 0)]).unwrap();
        assert_eq!(store.last_appended(&address(1)).unwrap(), Some(tx(6, 0)));
    }

    #[test]
    fn odd_length_history_keeps_middle_in_place() {
        let store = MemoryStore::new();
        store.create(&Subscriber::new(address(1), 0, 0)).unwrap();
        store.append(&address(1), &[tx(1, 0), tx(2, 0), tx(3, 0)]).unwrap();
        let reversed = store.all_reversed(&address(1)).unwrap();
        assert_eq!(reversed, vec![tx(3, 0), tx(2, 0), tx(1, 0)]);
        assert_eq!(reversed[1], tx(2, 0));
    }

    proptest! {
        #[test]
        fn all_reversed_is_exact_reverse_of_appends(
            batches in prop::collection::vec(prop::collection::vec(0u64..50, 0..5), 0..6)
        ) {
            let store = MemoryStore::new();
            store.create(&Subscriber::new(address(1), 0, 0)).unwrap();

            let mut appended = Vec::new();
            for (b, batch) in batches.iter().enumerate() {
                let txs: Vec<_> = batch.iter().map(|&i| tx(b as u64, i)).collect();
                store.append(&address(1), &txs).unwrap();
                appended.extend(txs);
            }

            let mut reversed = store.all_reversed(&address(1)).unwrap();
            let expected: Vec<_> = appended.iter().rev().cloned().collect();
            prop_assert_eq!(&reversed, &expected);

            reversed.reverse();
            prop_assert_eq!(reversed, appended);
        }
    }
}
