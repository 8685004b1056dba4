//! Global block watermark trait.

use crate::StoreError;

/// The highest block number any scan has reached.
///
/// The stored value never decreases. Implementations must make
/// [`WatermarkStore::advance_to`] atomic: two concurrent callers with
/// candidates `a < b` always leave `b` behind, whatever the interleaving.
pub trait WatermarkStore {
    /// Store `candidate` if it exceeds the current value.
    /// Returns whether the value changed.
    fn advance_to(&self, candidate: u64) -> Result<bool, StoreError>;

    /// The stored value, zero if never set.
    fn current(&self) -> Result<u64, StoreError>;
}
