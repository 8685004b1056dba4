//! Expiring record envelope and the retention policy that stamps it.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use chainwatch_types::{Clock, SystemClock, Timestamp};

use crate::LmdbError;

/// A stored value together with the moment it stops being visible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiring<T> {
    /// `None` means the record never expires.
    pub expires_at: Option<Timestamp>,
    pub value: T,
}

impl<T> Expiring<T> {
    pub fn is_live(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(deadline) => !deadline.is_reached(now),
            None => true,
        }
    }
}

/// How long written records stay visible.
///
/// A retention of zero seconds disables expiry. Every write restamps the
/// record, so the window is measured from the last write, not the first.
#[derive(Clone)]
pub struct TtlPolicy {
    retention_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TtlPolicy {
    pub fn new(retention_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            retention_secs,
            clock,
        }
    }

    /// Records never expire.
    pub fn forever() -> Self {
        Self::new(0, Arc::new(SystemClock))
    }

    pub fn retention_secs(&self) -> u64 {
        self.retention_secs
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn stamp<T>(&self, value: T) -> Expiring<T> {
        let expires_at = (self.retention_secs > 0)
            .then(|| self.clock.now().plus_secs(self.retention_secs));
        Expiring { expires_at, value }
    }

    /// Read and decode a record, treating an expired one as absent.
    pub(crate) fn read<T: DeserializeOwned>(
        &self,
        db: &Database<Bytes, Bytes>,
        txn: &RoTxn,
        key: &[u8],
    ) -> Result<Option<T>, LmdbError> {
        let Some(bytes) = db.get(txn, key)? else {
            return Ok(None);
        };
        let record: Expiring<T> = bincode::deserialize(bytes)?;
        Ok(record.is_live(self.now()).then_some(record.value))
    }

    /// Encode and write a record with a fresh deadline.
    pub(crate) fn write<T: Serialize>(
        &self,
        db: &Database<Bytes, Bytes>,
        txn: &mut RwTxn,
        key: &[u8],
        value: &T,
    ) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(&self.stamp(value))?;
        db.put(txn, key, &bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for TtlPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlPolicy")
            .field("retention_secs", &self.retention_secs)
            .finish_non_exhaustive()
    }
}

/// The deadline of an encoded record, without decoding its value.
///
/// `Expiring` encodes its deadline first, so the value type is irrelevant
/// here.
pub(crate) fn deadline_of(bytes: &[u8]) -> Result<Option<Timestamp>, LmdbError> {
    let deadline: Option<Timestamp> = bincode::deserialize(bytes)?;
    Ok(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn zero_retention_never_expires() {
        let policy = TtlPolicy::new(0, Arc::new(FixedClock(100)));
        let record = policy.stamp(7u64);
        assert_eq!(record.expires_at, None);
        assert!(record.is_live(Timestamp::new(u64::MAX)));
    }

    #[test]
    fn stamped_record_expires_after_retention() {
        let policy = TtlPolicy::new(30, Arc::new(FixedClock(100)));
        let record = policy.stamp("x");
        assert_eq!(record.expires_at, Some(Timestamp::new(130)));
        assert!(record.is_live(Timestamp::new(129)));
        assert!(!record.is_live(Timestamp::new(130)));
    }

    #[test]
    fn deadline_is_readable_from_prefix() {
        let policy = TtlPolicy::new(30, Arc::new(FixedClock(100)));
        let bytes = bincode::serialize(&policy.stamp(vec![1u8, 2, 3])).unwrap();
        assert_eq!(deadline_of(&bytes).unwrap(), Some(Timestamp::new(130)));
    }
}
