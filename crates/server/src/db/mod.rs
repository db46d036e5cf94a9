//! Database operations for the Orderline `PostgreSQL`.
//!
//! ## Tables
//!
//! - `orders` - Order headers, keyed by `order_id`
//! - `deliveries` - Delivery record, 1:1 with orders
//! - `payments` - Payment record, 1:1 with orders
//! - `order_items` - Line items, 1:N with orders
//!
//! The reference DDL lives in `crates/server/schema.sql`; the server never
//! creates or migrates the schema itself.
//!
//! The rest of the service depends on the [`OrderStore`] trait, not on the
//! schema's physical shape: connectivity probe, full snapshot for the cache
//! warm-load, single lookup, and the atomic multi-table insert.

pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orderline_core::{Order, OrderId};

pub use orders::PgOrderStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate `order_id`).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Durable persistence and retrieval of order aggregates.
///
/// The ingestion pipeline and the startup warm-load depend on this seam;
/// tests substitute an in-memory implementation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Probe connectivity to the underlying store.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Full snapshot of all persisted orders, for the cache warm-load.
    async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Look up a single order by its identifier.
    ///
    /// Diagnostics path; the hot read path goes through the cache.
    async fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Persist an order aggregate and all dependent records as one unit.
    ///
    /// Either all four record groups are durably written or none are.
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
