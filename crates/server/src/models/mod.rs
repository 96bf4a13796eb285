//! Domain models and their wire representations.
//!
//! The serde attributes encode the public API contract directly on the
//! domain types: camelCase names, `merchantId`/`itemId` for ids, and the
//! geohash kept off the wire (it is an index key, not part of the resource).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pronto_core::{Coordinate, MerchantCategory, MerchantId, OrderId, ProductCategory, ProductId};

/// A merchant in the catalog.
///
/// The geohash is computed from the location when the merchant is created
/// and never recomputed; moving a merchant would require re-indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    #[serde(rename = "merchantId")]
    pub id: MerchantId,
    pub name: String,
    #[serde(rename = "merchantCategory")]
    pub category: MerchantCategory,
    pub image_url: String,
    pub location: Coordinate,
    #[serde(skip)]
    pub geohash: String,
    pub created_at: DateTime<Utc>,
}

/// A product belonging to a merchant.
///
/// Prices are integer minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "itemId")]
    pub id: ProductId,
    #[serde(skip)]
    pub merchant_id: MerchantId,
    pub name: String,
    #[serde(rename = "productCategory")]
    pub category: ProductCategory,
    pub price: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// A merchant together with its product catalog.
///
/// A merchant with no products carries an empty list, never null.
#[derive(Debug, Clone, Serialize)]
pub struct MerchantWithItems {
    pub merchant: Merchant,
    pub items: Vec<Product>,
}

/// One priced line of a quote: a product at a merchant, with quantity and
/// the unit price captured at estimation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub merchant_id: MerchantId,
    pub item_id: ProductId,
    pub quantity: u32,
    pub unit_price: i64,
}

/// A priced, timed snapshot of a validated cart.
///
/// Lives in the estimate cache between creation and redemption (or flush)
/// and is redeemable into an order at most once.
#[derive(Debug, Clone)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub total_price: i64,
    pub total_minutes: i64,
    pub created_at: DateTime<Utc>,
}

/// A placed order in the history listing, grouped per merchant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub order_id: OrderId,
    pub orders: Vec<OrderDetail>,
}

/// One merchant's portion of a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub merchant: Merchant,
    pub items: Vec<ItemHistory>,
}

/// An ordered product with its quantity.
#[derive(Debug, Clone, Serialize)]
pub struct ItemHistory {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}
