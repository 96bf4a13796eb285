//! Postgres-backed catalog store.
//!
//! All queries are read-only. The bucket query filters on the indexed
//! geohash prefix; exact distance ranking happens in the service layer.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};

use pronto_core::{MerchantCategory, MerchantId, ProductCategory, ProductId};

use super::{CatalogStore, NearbyFilters, RepositoryError};
use crate::models::{Merchant, MerchantWithItems, Product};

const MERCHANT_COLUMNS: &str = "id, name, category, image_url, lat, long, geohash, created_at";
const PRODUCT_COLUMNS: &str = "id, merchant_id, name, category, price, image_url, created_at";

/// Catalog store over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new catalog store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn merchant_by_id(
        &self,
        id: &MerchantId,
    ) -> Result<Option<Merchant>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MERCHANT_COLUMNS} FROM merchant WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(merchant_from_row).transpose()
    }

    async fn product_for_merchant(
        &self,
        id: &ProductId,
        merchant_id: &MerchantId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1 AND merchant_id = $2"
        ))
        .bind(id.as_str())
        .bind(merchant_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn merchants_in_bucket(
        &self,
        prefix: &str,
        filters: &NearbyFilters,
    ) -> Result<Vec<MerchantWithItems>, RepositoryError> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {MERCHANT_COLUMNS} FROM merchant WHERE geohash LIKE "
        ));
        // The geohash alphabet contains no LIKE metacharacters
        query.push_bind(format!("{prefix}%"));

        if let Some(id) = &filters.merchant_id {
            query.push(" AND id = ").push_bind(id.clone());
        }
        if let Some(name) = &filters.name {
            query.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(category) = &filters.category {
            query.push(" AND category = ").push_bind(category.clone());
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        let merchants: Vec<Merchant> = rows
            .iter()
            .map(merchant_from_row)
            .collect::<Result<_, _>>()?;

        if merchants.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = merchants.iter().map(|m| m.id.to_string()).collect();
        let product_rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE merchant_id = ANY($1) ORDER BY created_at"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_merchant: HashMap<MerchantId, Vec<Product>> = HashMap::new();
        for row in &product_rows {
            let product = product_from_row(row)?;
            by_merchant
                .entry(product.merchant_id.clone())
                .or_default()
                .push(product);
        }

        Ok(merchants
            .into_iter()
            .map(|merchant| {
                let items = by_merchant.remove(&merchant.id).unwrap_or_default();
                MerchantWithItems { merchant, items }
            })
            .collect())
    }
}

pub(crate) fn merchant_from_row(row: &PgRow) -> Result<Merchant, RepositoryError> {
    let category: String = row.try_get("category")?;
    let category = MerchantCategory::parse(&category).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid merchant category in database: {e}"))
    })?;

    Ok(Merchant {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category,
        image_url: row.try_get("image_url")?,
        location: pronto_core::Coordinate::new(row.try_get("lat")?, row.try_get("long")?),
        geohash: row.try_get("geohash")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    let category: String = row.try_get("category")?;
    let category = ProductCategory::parse(&category).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid product category in database: {e}"))
    })?;

    Ok(Product {
        id: row.try_get("id")?,
        merchant_id: row.try_get("merchant_id")?,
        name: row.try_get("name")?,
        category,
        price: row.try_get("price")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
