//! In-memory store implementations.
//!
//! Fixtures for unit and router tests: the same trait surface as the
//! Postgres stores, backed by plain collections. The catalog is immutable
//! after construction; the order store records orders under a mutex.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use pronto_core::{MerchantId, OrderId, ProductId};

use super::{CatalogStore, HistoryQuery, NearbyFilters, OrderStore, RepositoryError};
use crate::models::{
    ItemHistory, Merchant, MerchantWithItems, OrderDetail, OrderHistory, Product, QuoteLine,
};

/// An immutable in-memory catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: Vec<MerchantWithItems>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a merchant and its products.
    #[must_use]
    pub fn with_merchant(mut self, merchant: Merchant, items: Vec<Product>) -> Self {
        self.entries.push(MerchantWithItems { merchant, items });
        self
    }

    fn merchant(&self, id: &MerchantId) -> Option<&Merchant> {
        self.entries
            .iter()
            .map(|e| &e.merchant)
            .find(|m| &m.id == id)
    }

    fn product(&self, id: &ProductId) -> Option<&Product> {
        self.entries
            .iter()
            .flat_map(|e| &e.items)
            .find(|p| &p.id == id)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn merchant_by_id(
        &self,
        id: &MerchantId,
    ) -> Result<Option<Merchant>, RepositoryError> {
        Ok(self.merchant(id).cloned())
    }

    async fn product_for_merchant(
        &self,
        id: &ProductId,
        merchant_id: &MerchantId,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .product(id)
            .filter(|p| &p.merchant_id == merchant_id)
            .cloned())
    }

    async fn merchants_in_bucket(
        &self,
        prefix: &str,
        filters: &NearbyFilters,
    ) -> Result<Vec<MerchantWithItems>, RepositoryError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.merchant.geohash.starts_with(prefix))
            .filter(|e| {
                filters
                    .merchant_id
                    .as_ref()
                    .is_none_or(|id| e.merchant.id.as_str() == id.as_str())
            })
            .filter(|e| filters.name.as_ref().is_none_or(|n| &e.merchant.name == n))
            .filter(|e| {
                filters
                    .category
                    .as_ref()
                    .is_none_or(|c| e.merchant.category.as_str() == c.as_str())
            })
            .cloned()
            .collect())
    }
}

struct StoredOrder {
    id: OrderId,
    username: String,
    lines: Vec<QuoteLine>,
}

/// An in-memory order store.
///
/// History entries are resolved against the shared [`MemoryCatalog`].
pub struct MemoryOrderStore {
    catalog: Arc<MemoryCatalog>,
    orders: Mutex<Vec<StoredOrder>>,
}

impl MemoryOrderStore {
    /// Create an empty order store resolving details from `catalog`.
    #[must_use]
    pub const fn new(catalog: Arc<MemoryCatalog>) -> Self {
        Self {
            catalog,
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Number of stored orders.
    ///
    /// # Panics
    ///
    /// Never panics; a poisoned lock is recovered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no orders have been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create_order(
        &self,
        username: &str,
        lines: &[QuoteLine],
    ) -> Result<OrderId, RepositoryError> {
        let id = OrderId::generate();
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoredOrder {
                id: id.clone(),
                username: username.to_owned(),
                lines: lines.to_vec(),
            });
        Ok(id)
    }

    async fn history(
        &self,
        username: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<OrderHistory>, RepositoryError> {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);

        // Page over the user's orders newest-first, then filter within the
        // page (matching the SQL store's limited-subquery shape)
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);

        let mut history = Vec::new();
        for order in orders
            .iter()
            .rev()
            .filter(|o| o.username == username)
            .skip(offset)
            .take(limit)
        {
            let mut details: Vec<OrderDetail> = Vec::new();
            for line in &order.lines {
                let (Some(merchant), Some(product)) = (
                    self.catalog.merchant(&line.merchant_id),
                    self.catalog.product(&line.item_id),
                ) else {
                    continue;
                };
                if !matches_history_filters(query, merchant, product) {
                    continue;
                }

                let item = ItemHistory {
                    product: product.clone(),
                    quantity: line.quantity,
                };
                match details.iter_mut().find(|d| d.merchant.id == merchant.id) {
                    Some(detail) => detail.items.push(item),
                    None => details.push(OrderDetail {
                        merchant: merchant.clone(),
                        items: vec![item],
                    }),
                }
            }

            if !details.is_empty() {
                history.push(OrderHistory {
                    order_id: order.id.clone(),
                    orders: details,
                });
            }
        }

        Ok(history)
    }
}

fn matches_history_filters(query: &HistoryQuery, merchant: &Merchant, product: &Product) -> bool {
    if let Some(id) = &query.merchant_id
        && merchant.id.as_str() != id.as_str()
    {
        return false;
    }
    if let Some(category) = &query.merchant_category
        && merchant.category.as_str() != category.as_str()
    {
        return false;
    }
    if let Some(name) = &query.name {
        let needle = name.to_lowercase();
        if !merchant.name.to_lowercase().contains(&needle)
            && !product.name.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}
