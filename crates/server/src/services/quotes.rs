//! The estimate cache: quotes held between estimation and redemption.
//!
//! A quote id handed to a client can be redeemed into an order at most
//! once. The cache guarantees that with a single mutual-exclusion domain:
//! `put`, `consume_once`, and `flush_all` all serialize on one lock, which
//! only ever covers in-memory map mutation - never I/O.
//!
//! Eviction is deliberately blunt: a background task empties the whole
//! cache on a fixed interval instead of expiring entries individually. A
//! quote that is not redeemed before the flush fires becomes permanently
//! unredeemable and the client must request a fresh estimate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use pronto_core::QuoteId;

use crate::models::Quote;

/// In-memory consume-once store for computed quotes.
///
/// Constructed once and shared through
/// [`AppState`](crate::state::AppState); not a process-wide singleton.
#[derive(Debug, Default)]
pub struct QuoteCache {
    entries: Mutex<HashMap<QuoteId, Quote>>,
}

impl QuoteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a quote under a freshly generated id and return the id.
    ///
    /// The quote is redeemable as soon as this returns; callers respond to
    /// the client only after the write has completed.
    pub fn put(&self, quote: Quote) -> QuoteId {
        let id = QuoteId::generate();
        self.lock().insert(id.clone(), quote);
        id
    }

    /// Atomically look up and remove a quote.
    ///
    /// Returns `None` for ids that were never issued, already redeemed, or
    /// evicted by a flush. Two racing calls on the same id cannot both
    /// receive the quote.
    pub fn consume_once(&self, id: &QuoteId) -> Option<Quote> {
        self.lock().remove(id)
    }

    /// Unconditionally evict every quote, returning how many were dropped.
    pub fn flush_all(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of quotes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache currently holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Start the periodic whole-cache flush task.
    pub fn spawn_flush(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick of an interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let flushed = cache.flush_all();
                if flushed > 0 {
                    tracing::debug!(flushed, "estimate cache flushed");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QuoteId, Quote>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
