//! Business logic services.
//!
//! # Services
//!
//! - `nearby` - proximity search over the geohash-bucketed catalog
//! - `cart` - cart validation ahead of estimation
//! - `route` - pricing and the heuristic multi-stop delivery time
//! - `quotes` - the consume-once estimate cache
//! - `orders` - quote redemption and order history
//!
//! Services borrow their stores from [`crate::state::AppState`] per request;
//! the only shared mutable state is the [`quotes::QuoteCache`].

pub mod cart;
pub mod nearby;
pub mod orders;
pub mod quotes;
pub mod route;
