//! Quote redemption and order history.
//!
//! Placing an order consumes the quote from the cache first and commits it
//! second. Once consumed, the quote is gone: if the commit then fails, the
//! request surfaces a server error and the client must request a fresh
//! estimate. There is no implicit retry and the quote is not re-inserted.

use thiserror::Error;

use pronto_core::{MerchantCategory, OrderId, QuoteId};

use crate::db::{HistoryQuery, OrderStore, RepositoryError};
use crate::models::OrderHistory;
use crate::services::quotes::QuoteCache;

/// Page size applied when the client sends no limit (or zero).
const DEFAULT_HISTORY_LIMIT: i64 = 5;

/// Order placement failures.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The estimate id was never issued, already redeemed, or flushed.
    #[error("calculatedEstimateId is not found")]
    EstimateNotFound,

    /// The order store failed; the consumed quote is not restored.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Raw order-history parameters as received on the wire.
#[derive(Debug, Clone, Default)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub merchant_id: Option<String>,
    pub merchant_category: Option<String>,
    pub name: Option<String>,
}

/// Order placement and history over the quote cache and order store.
pub struct OrderService<'a> {
    quotes: &'a QuoteCache,
    store: &'a dyn OrderStore,
}

impl<'a> OrderService<'a> {
    /// Create a service over the given cache and store.
    #[must_use]
    pub const fn new(quotes: &'a QuoteCache, store: &'a dyn OrderStore) -> Self {
        Self { quotes, store }
    }

    /// Redeem a quote into a persisted order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EstimateNotFound`] if the id is malformed,
    /// unknown, already redeemed, or was flushed;
    /// [`OrderError::Repository`] if the commit fails.
    pub async fn place(&self, username: &str, estimate_id: &str) -> Result<OrderId, OrderError> {
        let quote_id =
            QuoteId::parse(estimate_id).map_err(|_| OrderError::EstimateNotFound)?;
        let quote = self
            .quotes
            .consume_once(&quote_id)
            .ok_or(OrderError::EstimateNotFound)?;

        tracing::debug!(
            estimate_id = %quote_id,
            lines = quote.lines.len(),
            "redeeming estimate"
        );

        let order_id = self.store.create_order(username, &quote.lines).await?;
        Ok(order_id)
    }

    /// The caller's order history, newest first.
    ///
    /// An unrecognized merchant category disables that filter rather than
    /// failing the request.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Repository`] if the store fails.
    pub async fn history(
        &self,
        username: &str,
        params: &HistoryParams,
    ) -> Result<Vec<OrderHistory>, OrderError> {
        let limit = match params.limit {
            None | Some(i64::MIN..=0) => DEFAULT_HISTORY_LIMIT,
            Some(limit) => limit,
        };
        let merchant_category = params
            .merchant_category
            .as_deref()
            .and_then(|c| MerchantCategory::parse(c).ok())
            .map(|c| c.as_str().to_owned());

        let query = HistoryQuery {
            limit,
            offset: params.offset.unwrap_or(0).max(0),
            merchant_id: params.merchant_id.clone(),
            merchant_category,
            name: params.name.clone(),
        };

        Ok(self.store.history(username, &query).await?)
    }
}
