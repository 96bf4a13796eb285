//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health             - Liveness check
//! GET  /health/ready       - Readiness check (database ping)
//!
//! # Discovery
//! GET  /merchants/nearby   - Merchants near a coordinate, ranked by distance
//!
//! # Purchase flow
//! POST /orders/estimate    - Validate and price a cart, returns a quote id
//! POST /orders             - Redeem a quote into an order (requires auth)
//! GET  /orders             - Order history for the caller (requires auth)
//! ```

pub mod merchants;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the merchant discovery router.
pub fn merchant_routes() -> Router<AppState> {
    Router::new().route("/nearby", get(merchants::nearby))
}

/// Create the purchase-flow router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/estimate", post(orders::estimate))
        .route("/", post(orders::place).get(orders::history))
}

/// Create all routes for the marketplace API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/merchants", merchant_routes())
        .nest("/orders", order_routes())
}
