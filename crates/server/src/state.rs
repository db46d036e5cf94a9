//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::OrderCache;
use crate::config::ServerConfig;
use crate::db::PgOrderStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration, the order cache
/// (the read path), and the storage gateway (readiness probe only).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    cache: Arc<OrderCache>,
    store: PgOrderStore,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, cache: Arc<OrderCache>, store: PgOrderStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                cache,
                store,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the order cache.
    #[must_use]
    pub fn cache(&self) -> &OrderCache {
        &self.inner.cache
    }

    /// Get a reference to the storage gateway.
    #[must_use]
    pub fn store(&self) -> &PgOrderStore {
        &self.inner.store
    }
}
