//! Merchant discovery route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use pronto_core::Coordinate;

use crate::db::NearbyFilters;
use crate::error::ApiError;
use crate::models::MerchantWithItems;
use crate::services::nearby::{NearbyQuery, NearbySearch, effective_limit};
use crate::state::AppState;

/// Query parameters for `GET /merchants/nearby`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyParams {
    pub coordinate: Option<String>,
    pub merchant_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Response envelope for the nearby listing.
#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub data: Vec<MerchantWithItems>,
    pub meta: Meta,
}

/// Pagination echo plus the bucket-wide match count.
#[derive(Debug, Serialize)]
pub struct Meta {
    pub limit: u32,
    pub offset: u32,
    pub total: usize,
}

/// `GET /merchants/nearby?coordinate=<lat,long>` - merchants near the user,
/// ranked by distance, with their product catalogs embedded.
pub async fn nearby(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let coordinate = params
        .coordinate
        .as_deref()
        .ok_or_else(|| ApiError::Malformed("coordinate is not valid".to_owned()))?;
    let user = Coordinate::parse(coordinate)?;

    let limit = effective_limit(params.limit);
    let offset = params.offset.unwrap_or(0);
    let query = NearbyQuery {
        filters: NearbyFilters {
            merchant_id: params.merchant_id,
            name: params.name,
            category: params.category,
        },
        limit,
        offset,
    };

    let search = NearbySearch::new(state.catalog(), state.config().geo_prefix_len);
    let page = search.find_nearby(user, &query).await?;

    Ok(Json(NearbyResponse {
        data: page.data,
        meta: Meta {
            limit,
            offset,
            total: page.total,
        },
    }))
}
