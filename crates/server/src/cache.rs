//! In-memory order cache.
//!
//! A readers-writer lock around a hash map: arbitrarily many concurrent
//! `get` calls run in parallel, while a mutation (`upsert`/`bulk_load`)
//! excludes all reads and other mutations for its duration. Readers never
//! observe a partially written aggregate.
//!
//! The cache is constructed once in `main` and shared via `Arc` between the
//! ingestion pipeline (writer) and the HTTP lookup handlers (readers). It is
//! never persisted; the database is warm-load's only source.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use orderline_core::Order;

/// Thread-safe read-mostly store of the most recently ingested order per
/// identifier.
#[derive(Debug, Default)]
pub struct OrderCache {
    orders: RwLock<HashMap<String, Order>>,
}

impl OrderCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every given order, keyed by its id, overwriting existing
    /// entries. Returns the number of entries resident afterwards.
    ///
    /// Intended for the one-time startup warm-up; the whole batch is applied
    /// under a single write lock, so concurrent readers see either none or
    /// all of it.
    pub fn bulk_load(&self, orders: impl IntoIterator<Item = Order>) -> usize {
        let mut map = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        for order in orders {
            map.insert(order.order_id.as_str().to_owned(), order);
        }
        map.len()
    }

    /// Insert or replace the entry for the order's id.
    ///
    /// Always succeeds; validation happened upstream. This is the
    /// publication point that makes an ingested order visible to readers.
    pub fn upsert(&self, order: Order) {
        let mut map = self.orders.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(order.order_id.as_str().to_owned(), order);
    }

    /// Look up the cached aggregate for an id.
    ///
    /// Never blocks on storage or network; a miss is authoritative for
    /// "currently unknown to this process".
    #[must_use]
    pub fn get(&self, order_id: &str) -> Option<Order> {
        let map = self.orders.read().unwrap_or_else(PoisonError::into_inner);
        map.get(order_id).cloned()
    }

    /// Number of cached orders.
    #[must_use]
    pub fn len(&self) -> usize {
        let map = self.orders.read().unwrap_or_else(PoisonError::into_inner);
        map.len()
    }

    /// Whether the cache holds no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
