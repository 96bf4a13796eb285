//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::catalog::PgCatalogStore;
use crate::db::orders::PgOrderStore;
use crate::db::{CatalogStore, OrderStore};
use crate::services::quotes::QuoteCache;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The stores are trait objects so tests can
/// swap the Postgres implementations for in-memory ones.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    quotes: Arc<QuoteCache>,
}

impl AppState {
    /// Create application state backed by Postgres stores.
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let catalog = Arc::new(PgCatalogStore::new(pool.clone()));
        let orders = Arc::new(PgOrderStore::new(pool.clone()));
        Self::with_stores(config, pool, catalog, orders)
    }

    /// Create application state with explicit store implementations.
    #[must_use]
    pub fn with_stores(
        config: AppConfig,
        pool: PgPool,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                orders,
                quotes: Arc::new(QuoteCache::new()),
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogStore {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// Get a reference to the estimate cache.
    #[must_use]
    pub fn quotes(&self) -> &QuoteCache {
        &self.inner.quotes
    }

    /// Start the periodic estimate-cache flush in the background.
    pub fn start_estimate_flush(&self) {
        let every = Duration::from_secs(self.inner.config.estimate_flush_secs);
        // Detached; the task runs for the life of the process
        drop(Arc::clone(&self.inner.quotes).spawn_flush(every));
    }
}
