//! Purchase-flow route handlers: estimation, placement, history.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use pronto_core::OrderId;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{OrderHistory, Quote};
use crate::services::cart::{Cart, CartValidator};
use crate::services::orders::{HistoryParams, OrderService};
use crate::services::route;
use crate::state::AppState;

/// Response body for `POST /orders/estimate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub total_price: i64,
    pub estimated_delivery_time_in_minutes: i64,
    pub calculated_estimate_id: String,
}

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub calculated_estimate_id: Option<String>,
}

/// Response body for `POST /orders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQueryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub merchant_id: Option<String>,
    pub merchant_category: Option<String>,
    pub name: Option<String>,
}

/// `POST /orders/estimate` - validate a cart, price it, and hold the quote
/// for redemption.
pub async fn estimate(
    State(state): State<AppState>,
    payload: Result<Json<Cart>, JsonRejection>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let Json(cart) = payload.map_err(|e| ApiError::Malformed(e.body_text()))?;
    check_shape(&cart)?;

    let validated = CartValidator::new(state.catalog()).validate(&cart).await?;
    let estimate = route::estimate(&validated);

    let quote = Quote {
        lines: validated.lines,
        total_price: estimate.total_price,
        total_minutes: estimate.total_minutes,
        created_at: Utc::now(),
    };
    // The write is synchronous: the id must be redeemable by the time the
    // client can see it
    let quote_id = state.quotes().put(quote);

    tracing::debug!(
        estimate_id = %quote_id,
        total_price = estimate.total_price,
        minutes = estimate.total_minutes,
        distance_km = estimate.total_distance_km,
        "estimate created"
    );

    Ok(Json(EstimateResponse {
        total_price: estimate.total_price,
        estimated_delivery_time_in_minutes: estimate.total_minutes,
        calculated_estimate_id: quote_id.into_inner(),
    }))
}

/// `POST /orders` - redeem a previously computed estimate into an order.
pub async fn place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Malformed(e.body_text()))?;
    let estimate_id = request
        .calculated_estimate_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Malformed("calculatedEstimateId is required".to_owned()))?;

    let service = OrderService::new(state.quotes(), state.orders());
    let order_id = service.place(&user.username, &estimate_id).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse { order_id })))
}

/// `GET /orders` - the caller's order history, newest first.
pub async fn history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<Vec<OrderHistory>>, ApiError> {
    let service = OrderService::new(state.quotes(), state.orders());
    let history = service
        .history(
            &user.username,
            &HistoryParams {
                limit: params.limit,
                offset: params.offset,
                merchant_id: params.merchant_id,
                merchant_category: params.merchant_category,
                name: params.name,
            },
        )
        .await?;

    Ok(Json(history))
}

/// Structural checks on the cart body; business rules live in the validator.
fn check_shape(cart: &Cart) -> Result<(), ApiError> {
    if cart.orders.is_empty() {
        return Err(ApiError::Malformed(
            "orders must not be empty".to_owned(),
        ));
    }
    for entry in &cart.orders {
        if entry.items.is_empty() {
            return Err(ApiError::Malformed(
                "every order needs at least one item".to_owned(),
            ));
        }
        if entry.items.iter().any(|line| line.quantity == 0) {
            return Err(ApiError::Malformed(
                "item quantity must be at least 1".to_owned(),
            ));
        }
    }
    Ok(())
}
