//! Cart validation ahead of estimation.
//!
//! A cart names merchants and items by raw string id; validation resolves
//! every reference through the catalog and produces the [`ValidatedCart`]
//! the route estimator runs on. Checks run in a fixed order, each with its
//! own failure kind:
//!
//! 1. exactly one entry is marked as the starting point;
//! 2. every merchant and item id resolves (items scoped to their entry's
//!    merchant) - an id that is not even a well-formed ULID cannot resolve
//!    and reports as not-found;
//! 3. the starting merchant is within delivery range of the user.

use serde::Deserialize;
use thiserror::Error;

use pronto_core::{Coordinate, MerchantId, ProductId, geo};

use crate::db::{CatalogStore, RepositoryError};
use crate::models::QuoteLine;

/// Maximum distance between the user and the starting merchant.
pub const MAX_STARTING_DISTANCE_KM: f64 = 3.0;

/// An estimation request cart as received on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_location: Coordinate,
    pub orders: Vec<CartEntry>,
}

/// One merchant's portion of a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub merchant_id: String,
    #[serde(default)]
    pub is_starting_point: bool,
    pub items: Vec<CartLine>,
}

/// An item and quantity within a cart entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: String,
    pub quantity: u32,
}

/// Cart validation failures, in the order the checks run.
#[derive(Debug, Error)]
pub enum CartError {
    /// Zero or several entries were flagged as the starting point.
    #[error("exactly one order must have isStartingPoint set to true")]
    StartingPoint,

    /// A merchant id did not resolve (unknown, or not a well-formed id).
    #[error("merchant {0} not found")]
    MerchantNotFound(String),

    /// An item id did not resolve for its entry's merchant.
    #[error("item {0} not found")]
    ItemNotFound(String),

    /// The starting merchant is out of delivery range.
    #[error("merchant {0} is too far from the user location")]
    OutOfRange(String),

    /// The catalog store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A resolved merchant stop on the delivery route.
#[derive(Debug, Clone)]
pub struct Stop {
    pub merchant_id: MerchantId,
    pub location: Coordinate,
}

/// A cart that passed validation: resolved stops and priced lines.
#[derive(Debug, Clone)]
pub struct ValidatedCart {
    pub user_location: Coordinate,
    /// The starting merchant.
    pub start: Stop,
    /// Distinct non-starting merchants, in cart enumeration order.
    pub stops: Vec<Stop>,
    /// Flattened lines with unit prices captured from the catalog.
    pub lines: Vec<QuoteLine>,
}

/// Validates carts against the catalog.
pub struct CartValidator<'a> {
    catalog: &'a dyn CatalogStore,
}

impl<'a> CartValidator<'a> {
    /// Create a validator over the given catalog.
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogStore) -> Self {
        Self { catalog }
    }

    /// Validate a cart, resolving every reference.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`CartError`].
    pub async fn validate(&self, cart: &Cart) -> Result<ValidatedCart, CartError> {
        let starting_points = cart
            .orders
            .iter()
            .filter(|entry| entry.is_starting_point)
            .count();
        if starting_points != 1 {
            return Err(CartError::StartingPoint);
        }

        let mut start: Option<Stop> = None;
        let mut stops: Vec<Stop> = Vec::new();
        let mut lines: Vec<QuoteLine> = Vec::new();

        for entry in &cart.orders {
            let merchant_id = MerchantId::parse(&entry.merchant_id)
                .map_err(|_| CartError::MerchantNotFound(entry.merchant_id.clone()))?;
            let merchant = self
                .catalog
                .merchant_by_id(&merchant_id)
                .await?
                .ok_or_else(|| CartError::MerchantNotFound(entry.merchant_id.clone()))?;

            for line in &entry.items {
                let item_id = ProductId::parse(&line.item_id)
                    .map_err(|_| CartError::ItemNotFound(line.item_id.clone()))?;
                let product = self
                    .catalog
                    .product_for_merchant(&item_id, &merchant_id)
                    .await?
                    .ok_or_else(|| CartError::ItemNotFound(line.item_id.clone()))?;

                lines.push(QuoteLine {
                    merchant_id: merchant_id.clone(),
                    item_id,
                    quantity: line.quantity,
                    unit_price: product.price,
                });
            }

            let stop = Stop {
                merchant_id: merchant_id.clone(),
                location: merchant.location,
            };
            if entry.is_starting_point {
                start = Some(stop);
            } else if !stops.iter().any(|s| s.merchant_id == merchant_id) {
                stops.push(stop);
            }
        }

        // Guaranteed by the cardinality check above
        let Some(start) = start else {
            return Err(CartError::StartingPoint);
        };
        // The starting merchant may also appear in a non-starting entry
        stops.retain(|s| s.merchant_id != start.merchant_id);

        let range = geo::distance_km(cart.user_location, start.location);
        if range > MAX_STARTING_DISTANCE_KM {
            return Err(CartError::OutOfRange(start.merchant_id.to_string()));
        }

        Ok(ValidatedCart {
            user_location: cart.user_location,
            start,
            stops,
            lines,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryCatalog;
    use crate::models::{Merchant, Product};
    use chrono::Utc;
    use pronto_core::{MerchantCategory, ProductCategory};

    fn merchant_at(lat: f64, long: f64) -> Merchant {
        let location = Coordinate::new(lat, long);
        Merchant {
            id: MerchantId::generate(),
            name: "Bakso Corner".to_owned(),
            category: MerchantCategory::SmallRestaurant,
            image_url: "https://img.example.com/bakso.jpg".to_owned(),
            location,
            geohash: geo::encode(location),
            created_at: Utc::now(),
        }
    }

    fn product_of(merchant: &Merchant, price: i64) -> Product {
        Product {
            id: ProductId::generate(),
            merchant_id: merchant.id.clone(),
            name: "Bakso Urat".to_owned(),
            category: ProductCategory::Food,
            price,
            image_url: "https://img.example.com/item.jpg".to_owned(),
            created_at: Utc::now(),
        }
    }

    fn entry(merchant: &Merchant, product: &Product, starting: bool) -> CartEntry {
        CartEntry {
            merchant_id: merchant.id.to_string(),
            is_starting_point: starting,
            items: vec![CartLine {
                item_id: product.id.to_string(),
                quantity: 1,
            }],
        }
    }

    #[tokio::test]
    async fn test_valid_cart_passes() {
        let merchant = merchant_at(0.0, 0.01);
        let product = product_of(&merchant, 12_000);
        let catalog =
            MemoryCatalog::new().with_merchant(merchant.clone(), vec![product.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![entry(&merchant, &product, true)],
        };
        let validated = CartValidator::new(&catalog).validate(&cart).await.unwrap();

        assert_eq!(validated.start.merchant_id, merchant.id);
        assert!(validated.stops.is_empty());
        assert_eq!(validated.lines.len(), 1);
        assert_eq!(validated.lines[0].unit_price, 12_000);
    }

    #[tokio::test]
    async fn test_no_starting_point_is_rejected() {
        let merchant = merchant_at(0.0, 0.01);
        let product = product_of(&merchant, 1_000);
        let catalog =
            MemoryCatalog::new().with_merchant(merchant.clone(), vec![product.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![entry(&merchant, &product, false)],
        };
        let err = CartValidator::new(&catalog)
            .validate(&cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::StartingPoint));
    }

    #[tokio::test]
    async fn test_two_starting_points_are_rejected() {
        let a = merchant_at(0.0, 0.01);
        let b = merchant_at(0.0, 0.02);
        let product_a = product_of(&a, 1_000);
        let product_b = product_of(&b, 1_000);
        let catalog = MemoryCatalog::new()
            .with_merchant(a.clone(), vec![product_a.clone()])
            .with_merchant(b.clone(), vec![product_b.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![entry(&a, &product_a, true), entry(&b, &product_b, true)],
        };
        let err = CartValidator::new(&catalog)
            .validate(&cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::StartingPoint));
    }

    #[tokio::test]
    async fn test_malformed_merchant_id_reports_not_found() {
        let merchant = merchant_at(0.0, 0.01);
        let product = product_of(&merchant, 1_000);
        let catalog = MemoryCatalog::new().with_merchant(merchant, vec![product]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![CartEntry {
                merchant_id: "definitely-not-a-ulid".to_owned(),
                is_starting_point: true,
                items: vec![CartLine {
                    item_id: ProductId::generate().to_string(),
                    quantity: 1,
                }],
            }],
        };
        let err = CartValidator::new(&catalog)
            .validate(&cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::MerchantNotFound(_)));
    }

    #[tokio::test]
    async fn test_item_of_other_merchant_reports_not_found() {
        let a = merchant_at(0.0, 0.01);
        let b = merchant_at(0.0, 0.02);
        let product_a = product_of(&a, 1_000);
        let product_b = product_of(&b, 1_000);
        let catalog = MemoryCatalog::new()
            .with_merchant(a.clone(), vec![product_a])
            .with_merchant(b, vec![product_b.clone()]);

        // Item b ordered from merchant a
        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![entry(&a, &product_b, true)],
        };
        let err = CartValidator::new(&catalog)
            .validate(&cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_distant_starting_merchant_is_out_of_range() {
        // ~5.5 km east of the user, ids all resolve
        let merchant = merchant_at(0.0, 0.05);
        let product = product_of(&merchant, 1_000);
        let catalog =
            MemoryCatalog::new().with_merchant(merchant.clone(), vec![product.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![entry(&merchant, &product, true)],
        };
        let err = CartValidator::new(&catalog)
            .validate(&cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::OutOfRange(_)));
    }

    #[tokio::test]
    async fn test_distant_non_starting_merchant_is_allowed() {
        let near = merchant_at(0.0, 0.01);
        let far = merchant_at(0.0, 0.05);
        let product_near = product_of(&near, 1_000);
        let product_far = product_of(&far, 1_000);
        let catalog = MemoryCatalog::new()
            .with_merchant(near.clone(), vec![product_near.clone()])
            .with_merchant(far.clone(), vec![product_far.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![
                entry(&near, &product_near, true),
                entry(&far, &product_far, false),
            ],
        };
        let validated = CartValidator::new(&catalog).validate(&cart).await.unwrap();
        assert_eq!(validated.stops.len(), 1);
        assert_eq!(validated.stops[0].merchant_id, far.id);
    }

    #[tokio::test]
    async fn test_duplicate_merchant_entries_collapse_to_one_stop() {
        let start = merchant_at(0.0, 0.01);
        let other = merchant_at(0.0, 0.02);
        let product_start = product_of(&start, 1_000);
        let product_other = product_of(&other, 1_000);
        let catalog = MemoryCatalog::new()
            .with_merchant(start.clone(), vec![product_start.clone()])
            .with_merchant(other.clone(), vec![product_other.clone()]);

        let cart = Cart {
            user_location: Coordinate::new(0.0, 0.0),
            orders: vec![
                entry(&other, &product_other, false),
                entry(&start, &product_start, true),
                entry(&other, &product_other, false),
                // The starting merchant appears again without the flag
                entry(&start, &product_start, false),
            ],
        };
        let validated = CartValidator::new(&catalog).validate(&cart).await.unwrap();

        assert_eq!(validated.stops.len(), 1);
        assert_eq!(validated.stops[0].merchant_id, other.id);
        assert_eq!(validated.lines.len(), 4);
    }
}
