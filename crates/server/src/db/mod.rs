//! Database access for the marketplace `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `merchant` - catalog merchants with their precomputed geohash
//! - `product` - catalog products, owned by a merchant
//! - `purchase_order` - placed orders
//! - `purchase_order_item` - line items of a placed order
//!
//! The catalog tables are read-only from this service's point of view;
//! they are populated out of band (see `pronto-cli seed`).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p pronto-cli -- migrate
//! ```
//!
//! # Store traits
//!
//! The service layer depends on [`CatalogStore`] and [`OrderStore`] rather
//! than on `PgPool` directly, so the backing store is swappable: Postgres in
//! production ([`catalog::PgCatalogStore`], [`orders::PgOrderStore`]),
//! in-memory fixtures in tests ([`memory`]).

pub mod catalog;
pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use pronto_core::{MerchantId, OrderId, ProductId};

use crate::models::{Merchant, MerchantWithItems, OrderHistory, Product, QuoteLine};

/// Errors from the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Equality filters for a proximity query.
///
/// Filters are matched verbatim against the stored values; a value outside
/// the known category set simply matches nothing.
#[derive(Debug, Clone, Default)]
pub struct NearbyFilters {
    pub merchant_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
}

/// Parameters for the order-history listing.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub limit: i64,
    pub offset: i64,
    pub merchant_id: Option<String>,
    pub merchant_category: Option<String>,
    /// Case-insensitive substring match on merchant or product names.
    pub name: Option<String>,
}

/// Read-only access to the merchant/product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a merchant by id.
    async fn merchant_by_id(&self, id: &MerchantId)
    -> Result<Option<Merchant>, RepositoryError>;

    /// Look up a product by id, scoped to its owning merchant.
    async fn product_for_merchant(
        &self,
        id: &ProductId,
        merchant_id: &MerchantId,
    ) -> Result<Option<Product>, RepositoryError>;

    /// All merchants whose geohash starts with `prefix` and who satisfy the
    /// filters, each with its full product list.
    async fn merchants_in_bucket(
        &self,
        prefix: &str,
        filters: &NearbyFilters,
    ) -> Result<Vec<MerchantWithItems>, RepositoryError>;
}

/// Durable storage for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and its line items as one atomic transaction.
    ///
    /// On success, every line is visible; on failure, none are.
    async fn create_order(
        &self,
        username: &str,
        lines: &[QuoteLine],
    ) -> Result<OrderId, RepositoryError>;

    /// The caller's order history, newest first, grouped per order and
    /// merchant.
    async fn history(
        &self,
        username: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<OrderHistory>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
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
