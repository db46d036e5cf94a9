//! Ingestion pipeline: stream message to cache-visible, durably-stored order.
//!
//! Each message moves through `Received -> Decoded -> Persisted -> Cached`.
//! Any failure before `Cached` abandons that message - logged, skipped, loop
//! continues with the next one. The loop never retries a message and never
//! crashes the process.
//!
//! Within a single message, persistence strictly precedes cache visibility:
//! the cache upsert is the publication point, and it only runs after the
//! storage transaction has committed. Readers therefore never see an order
//! that durable storage does not yet have.

pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use orderline_core::{DecodeError, Order, OrderId};

use crate::cache::OrderCache;
use crate::db::{OrderStore, RepositoryError};

pub use stream::{MessageStream, RedisStream, StreamError};

/// Pause after a broker error before polling again.
const STREAM_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Why a message was abandoned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The payload did not decode into an order aggregate.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The storage write failed; the order is neither cached nor assumed
    /// processed.
    #[error("storage write failed: {0}")]
    Storage(#[from] RepositoryError),
}

/// The consumer loop turning stream messages into cached orders.
pub struct IngestPipeline<S, M> {
    store: S,
    cache: Arc<OrderCache>,
    stream: M,
}

impl<S, M> IngestPipeline<S, M>
where
    S: OrderStore,
    M: MessageStream,
{
    /// Wire a pipeline over the given store, cache, and stream.
    pub const fn new(store: S, cache: Arc<OrderCache>, stream: M) -> Self {
        Self {
            store,
            cache,
            stream,
        }
    }

    /// Consume messages until the shutdown signal flips.
    ///
    /// Messages are processed sequentially; per-message failures are logged
    /// and skipped, broker errors are retried after a short backoff.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Ingestion pipeline started");

        loop {
            let payload = tokio::select! {
                _ = shutdown.changed() => break,
                received = self.stream.next_message() => match received {
                    Ok(Some(payload)) => payload,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "Stream read failed, retrying");
                        tokio::time::sleep(STREAM_RETRY_BACKOFF).await;
                        continue;
                    }
                },
            };

            match self.process(&payload).await {
                Ok(order_id) => {
                    tracing::info!(order_id = %order_id, "Order ingested");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Message abandoned");
                }
            }
        }

        tracing::info!("Ingestion pipeline stopped");
    }

    /// Run one message through decode, persist, and cache publication.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Decode`] for malformed payloads and
    /// [`IngestError::Storage`] when the durable write fails (including
    /// duplicate-key conflicts). In both cases the cache is untouched.
    pub async fn process(&self, payload: &[u8]) -> Result<OrderId, IngestError> {
        let order = Order::from_json(payload)?;
        let order_id = order.order_id.clone();

        self.store.insert_order(&order).await?;

        // Publication point: the aggregate is durable, make it visible.
        self.cache.upsert(order);

        Ok(order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use orderline_core::{Delivery, OrderItem, Payment};

    use super::*;

    fn sample_order(id: &str) -> Order {
        Order {
            order_id: id.into(),
            track_number: format!("TRACK-{id}"),
            entry: "WBIL".to_string(),
            locale: "en".to_string(),
            customer_id: "test".to_string(),
            delivery_service: "meest".to_string(),
            created_at: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
            delivery: Delivery {
                name: "Test Testov".to_string(),
                phone: "+9720000000".to_string(),
                zip: "2639809".to_string(),
                city: "Kiryat Mozkin".to_string(),
                address: "Ploshad Mira 15".to_string(),
                region: "Kraiot".to_string(),
                email: "test@gmail.com".to_string(),
            },
            payment: Payment {
                transaction: format!("txn-{id}"),
                currency: "USD".to_string(),
                provider: "wbpay".to_string(),
                amount: 1817,
                payment_dt: 1_637_907_727,
                bank: "alpha".to_string(),
                delivery_cost: 1500,
                goods_total: 317,
                custom_fee: 0,
            },
            items: vec![OrderItem {
                chrt_id: 9_934_930,
                track_number: format!("TRACK-{id}"),
                price: 453,
                rid: format!("rid-{id}"),
                name: "Mascaras".to_string(),
                sale: 30,
                size: "0".to_string(),
                total_price: 317,
                nm_id: 2_389_212,
                brand: "Vivienne Sabo".to_string(),
                status: 202,
            }],
        }
    }

    fn payload(order: &Order) -> Vec<u8> {
        serde_json::to_vec(order).unwrap()
    }

    /// In-memory store that records inserts, rejects duplicates, and can be
    /// told to fail. It watches the shared cache to assert the aggregate is
    /// not yet visible when the durable write happens.
    struct FakeStore {
        orders: Mutex<Vec<Order>>,
        fail_next: AtomicBool,
        cache: Arc<OrderCache>,
    }

    impl FakeStore {
        fn new(cache: &Arc<OrderCache>) -> Arc<Self> {
            Arc::new(Self {
                orders: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
                cache: Arc::clone(cache),
            })
        }

        fn inserted_ids(&self) -> Vec<String> {
            self.orders
                .lock()
                .unwrap()
                .iter()
                .map(|o| o.order_id.as_str().to_owned())
                .collect()
        }
    }

    #[async_trait]
    impl OrderStore for Arc<FakeStore> {
        async fn ping(&self) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError> {
            Ok(self.orders.lock().unwrap().clone())
        }

        async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.order_id == *order_id)
                .cloned())
        }

        async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RepositoryError::Database(sqlx::Error::PoolClosed));
            }

            let mut orders = self.orders.lock().unwrap();
            if orders.iter().any(|o| o.order_id == order.order_id) {
                return Err(RepositoryError::Conflict(format!(
                    "order {} already exists",
                    order.order_id
                )));
            }

            // Durability-before-visibility: at write time the order must not
            // be readable from the cache yet.
            assert!(
                self.cache.get(order.order_id.as_str()).is_none(),
                "order became cache-visible before the durable write finished"
            );

            orders.push(order.clone());
            Ok(())
        }
    }

    /// Stream fed from a vector; yields `pending` once drained so a run loop
    /// only exits via the shutdown signal.
    struct ScriptedStream {
        payloads: Vec<Vec<u8>>,
    }

    #[async_trait]
    impl MessageStream for ScriptedStream {
        async fn next_message(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
            if self.payloads.is_empty() {
                std::future::pending::<()>().await;
            }
            Ok(Some(self.payloads.remove(0)))
        }
    }

    fn pipeline(
        store: &Arc<FakeStore>,
        cache: &Arc<OrderCache>,
        payloads: Vec<Vec<u8>>,
    ) -> IngestPipeline<Arc<FakeStore>, ScriptedStream> {
        IngestPipeline::new(
            Arc::clone(store),
            Arc::clone(cache),
            ScriptedStream { payloads },
        )
    }

    #[tokio::test]
    async fn test_process_persists_then_caches() {
        let cache = Arc::new(OrderCache::new());
        let store = FakeStore::new(&cache);
        let order = sample_order("abc123");
        let pipeline = pipeline(&store, &cache, vec![]);

        let order_id = pipeline.process(&payload(&order)).await.unwrap();

        assert_eq!(order_id.as_str(), "abc123");
        assert_eq!(store.inserted_ids(), vec!["abc123"]);
        assert_eq!(cache.get("abc123").unwrap(), order);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_abandoned() {
        let cache = Arc::new(OrderCache::new());
        let store = FakeStore::new(&cache);
        let pipeline = pipeline(&store, &cache, vec![]);

        let err = pipeline.process(b"{\"not\": \"an order\"}").await.unwrap_err();

        assert!(matches!(err, IngestError::Decode(_)));
        assert!(store.inserted_ids().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_empty_order_id_is_abandoned() {
        let cache = Arc::new(OrderCache::new());
        let store = FakeStore::new(&cache);
        let mut order = sample_order("abc123");
        order.order_id = "".into();
        let pipeline = pipeline(&store, &cache, vec![]);

        let err = pipeline.process(&payload(&order)).await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::Decode(DecodeError::MissingOrderId)
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_skips_message_only() {
        let cache = Arc::new(OrderCache::new());
        let store = FakeStore::new(&cache);
        store.fail_next.store(true, Ordering::SeqCst);
        let pipeline = pipeline(&store, &cache, vec![]);

        let first = sample_order("abc123");
        let err = pipeline.process(&payload(&first)).await.unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
        assert!(cache.get("abc123").is_none());

        // The next message is unaffected.
        let second = sample_order("def456");
        pipeline.process(&payload(&second)).await.unwrap();
        assert_eq!(cache.get("def456").unwrap(), second);
        assert_eq!(store.inserted_ids(), vec!["def456"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts_and_cache_keeps_first() {
        let cache = Arc::new(OrderCache::new());
        let store = FakeStore::new(&cache);
        let pipeline = pipeline(&store, &cache, vec![]);

        let order = sample_order("abc123");
        pipeline.process(&payload(&order)).await.unwrap();

        // Re-delivery of the same id: insert semantics reject it, the cached
        // aggregate stays as-is.
        let mut redelivery = sample_order("abc123");
        redelivery.delivery.city = "Haifa".to_string();
        let err = pipeline.process(&payload(&redelivery)).await;
        assert!(matches!(err, Err(IngestError::Storage(RepositoryError::Conflict(_)))));
        assert_eq!(cache.get("abc123").unwrap().delivery.city, "Kiryat Mozkin");
    }

    #[tokio::test]
    async fn test_run_processes_stream_and_stops_on_shutdown() {
        let cache = Arc::new(OrderCache::new());
        let orders = [sample_order("abc123"), sample_order("def456")];
        let payloads = vec![
            payload(&orders[0]),
            b"garbage".to_vec(),
            payload(&orders[1]),
        ];

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let store = FakeStore::new(&cache);
        let handle = tokio::spawn(pipeline(&store, &cache, payloads).run(shutdown_rx));

        // Wait for both valid orders to land, then signal shutdown.
        tokio::time::timeout(Duration::from_secs(5), async {
            while cache.get("def456").is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(cache.get("abc123").is_some());
        assert!(cache.get("def456").is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(store.inserted_ids(), vec!["abc123", "def456"]);
    }
}
