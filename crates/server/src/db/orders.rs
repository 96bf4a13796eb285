//! Postgres-backed order store.
//!
//! Order placement is an explicit scoped transaction: begin, insert the
//! order row and every line item, commit. The first failure rolls the
//! transaction back before the error propagates, so no partial order is
//! ever visible.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use pronto_core::{MerchantCategory, MerchantId, OrderId, ProductCategory};

use super::{HistoryQuery, OrderStore, RepositoryError};
use crate::models::{ItemHistory, Merchant, OrderDetail, OrderHistory, Product, QuoteLine};

/// Order store over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(
        &self,
        username: &str,
        lines: &[QuoteLine],
    ) -> Result<OrderId, RepositoryError> {
        let order_id = OrderId::generate();
        let mut tx = self.pool.begin().await?;

        match insert_order(&mut tx, &order_id, username, lines).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(order_id)
            }
            Err(e) => {
                // Roll back before propagating; the rollback error (if any)
                // is secondary to the insert failure
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "order transaction rollback failed");
                }
                Err(e.into())
            }
        }
    }

    async fn history(
        &self,
        username: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<OrderHistory>, RepositoryError> {
        let order_rows = sqlx::query(
            "SELECT id FROM purchase_order WHERE username = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let order_ids: Vec<String> = order_rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<Result<_, _>>()?;

        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut item_query = QueryBuilder::new(
            "SELECT oi.order_id, oi.quantity, \
             m.id AS merchant_id, m.name AS merchant_name, m.category AS merchant_category, \
             m.image_url AS merchant_image_url, m.lat, m.long, m.geohash, \
             m.created_at AS merchant_created_at, \
             p.id AS product_id, p.name AS product_name, p.category AS product_category, \
             p.price, p.image_url AS product_image_url, p.created_at AS product_created_at \
             FROM purchase_order_item oi \
             JOIN merchant m ON m.id = oi.merchant_id \
             JOIN product p ON p.id = oi.item_id \
             WHERE oi.order_id = ANY(",
        );
        item_query.push_bind(order_ids.clone()).push(")");

        if let Some(id) = &query.merchant_id {
            item_query.push(" AND m.id = ").push_bind(id.clone());
        }
        if let Some(category) = &query.merchant_category {
            item_query
                .push(" AND m.category = ")
                .push_bind(category.clone());
        }
        if let Some(name) = &query.name {
            let pattern = format!("%{}%", name.to_lowercase());
            item_query
                .push(" AND (LOWER(m.name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(p.name) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        item_query.push(" ORDER BY oi.created_at");

        let rows = item_query.build().fetch_all(&self.pool).await?;

        group_history(&order_ids, &rows)
    }
}

async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &OrderId,
    username: &str,
    lines: &[QuoteLine],
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO purchase_order (id, username) VALUES ($1, $2)")
        .bind(order_id.as_str())
        .bind(username)
        .execute(&mut **tx)
        .await?;

    for line in lines {
        sqlx::query(
            "INSERT INTO purchase_order_item (order_id, merchant_id, item_id, quantity) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id.as_str())
        .bind(line.merchant_id.as_str())
        .bind(line.item_id.as_str())
        .bind(i64::from(line.quantity))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Group joined line rows into per-order, per-merchant history entries,
/// preserving the page's order-id ordering. Orders whose items were all
/// filtered away are dropped.
fn group_history(
    order_ids: &[String],
    rows: &[PgRow],
) -> Result<Vec<OrderHistory>, RepositoryError> {
    let mut grouped: HashMap<String, Vec<(Merchant, ItemHistory)>> = HashMap::new();

    for row in rows {
        let order_id: String = row.try_get("order_id")?;
        let merchant = history_merchant_from_row(row)?;
        let product = history_product_from_row(row)?;
        let quantity: i64 = row.try_get("quantity")?;
        let item = ItemHistory {
            product,
            quantity: u32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative quantity in order {order_id}"))
            })?,
        };
        grouped.entry(order_id).or_default().push((merchant, item));
    }

    let mut history = Vec::new();
    for order_id in order_ids {
        let Some(entries) = grouped.remove(order_id) else {
            continue;
        };

        let mut details: Vec<OrderDetail> = Vec::new();
        for (merchant, item) in entries {
            match details.iter_mut().find(|d| d.merchant.id == merchant.id) {
                Some(detail) => detail.items.push(item),
                None => details.push(OrderDetail {
                    merchant,
                    items: vec![item],
                }),
            }
        }

        let order_id = OrderId::parse(order_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order id in database: {e}"))
        })?;
        history.push(OrderHistory {
            order_id,
            orders: details,
        });
    }

    Ok(history)
}

fn history_merchant_from_row(row: &PgRow) -> Result<Merchant, RepositoryError> {
    let category: String = row.try_get("merchant_category")?;
    let category = MerchantCategory::parse(&category).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid merchant category in database: {e}"))
    })?;

    Ok(Merchant {
        id: row.try_get("merchant_id")?,
        name: row.try_get("merchant_name")?,
        category,
        image_url: row.try_get("merchant_image_url")?,
        location: pronto_core::Coordinate::new(row.try_get("lat")?, row.try_get("long")?),
        geohash: row.try_get("geohash")?,
        created_at: row.try_get::<DateTime<Utc>, _>("merchant_created_at")?,
    })
}

fn history_product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    let category: String = row.try_get("product_category")?;
    let category = ProductCategory::parse(&category).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid product category in database: {e}"))
    })?;

    Ok(Product {
        id: row.try_get("product_id")?,
        merchant_id: row.try_get::<MerchantId, _>("merchant_id")?,
        name: row.try_get("product_name")?,
        category,
        price: row.try_get("price")?,
        image_url: row.try_get("product_image_url")?,
        created_at: row.try_get::<DateTime<Utc>, _>("product_created_at")?,
    })
}
