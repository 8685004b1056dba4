//! Subscriber storage trait.

use crate::StoreError;
use chainwatch_types::{Address, Subscriber};

/// One record per subscribed address.
pub trait SubscriberStore {
    /// Insert a new subscriber. Fails with [`StoreError::Conflict`] if the
    /// address is already present.
    fn create(&self, subscriber: &Subscriber) -> Result<(), StoreError>;

    /// Fetch a subscriber. Fails with [`StoreError::NotFound`] if absent.
    fn get(&self, address: &Address) -> Result<Subscriber, StoreError>;

    /// Replace the watermark of an existing subscriber.
    /// Fails with [`StoreError::NotFound`] if absent.
    fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError>;
}
