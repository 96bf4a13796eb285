//! Router tests over in-memory stores.
//!
//! These drive the real axum router in-process - handlers, extractors, and
//! error mapping included - with the Postgres stores swapped for the
//! in-memory fixtures, so no database is needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use pronto_core::{
    Coordinate, MerchantCategory, MerchantId, ProductCategory, ProductId, geo,
};
use pronto_server::config::AppConfig;
use pronto_server::db::memory::{MemoryCatalog, MemoryOrderStore};
use pronto_server::middleware::auth::issue_token;
use pronto_server::models::{Merchant, Product};
use pronto_server::routes;
use pronto_server::state::AppState;

const TOKEN_SECRET: &str = "router-test-signing-secret-0123456789";

fn merchant_at(name: &str, lat: f64, long: f64) -> Merchant {
    let location = Coordinate::new(lat, long);
    Merchant {
        id: MerchantId::generate(),
        name: name.to_owned(),
        category: MerchantCategory::SmallRestaurant,
        image_url: format!("https://img.example.com/{name}.jpg"),
        location,
        geohash: geo::encode(location),
        created_at: Utc::now(),
    }
}

fn product_of(merchant: &Merchant, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::generate(),
        merchant_id: merchant.id.clone(),
        name: name.to_owned(),
        category: ProductCategory::Food,
        price,
        image_url: "https://img.example.com/item.jpg".to_owned(),
        created_at: Utc::now(),
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost/pronto_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        token_secret: SecretString::from(TOKEN_SECRET),
        geo_prefix_len: 3,
        estimate_flush_secs: 300,
        sentry_dsn: None,
    }
}

fn app_with(catalog: MemoryCatalog) -> Router {
    let catalog = Arc::new(catalog);
    let orders = Arc::new(MemoryOrderStore::new(Arc::clone(&catalog)));
    // Lazy pool: never connected, only the readiness probe would touch it
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/pronto_test")
        .unwrap();
    let state = AppState::with_stores(test_config(), pool, catalog, orders);
    routes::routes().with_state(state)
}

/// The standard two-merchant fixture: user at the origin, A (starting)
/// 0.01 deg east with a 10000-priced item, B 0.02 deg east with a
/// 5000-priced item.
fn two_merchant_world() -> (MemoryCatalog, Value) {
    let a = merchant_at("Warung A", 0.0, 0.01);
    let b = merchant_at("Warung B", 0.0, 0.02);
    let item_a = product_of(&a, "Nasi Goreng", 10_000);
    let item_b = product_of(&b, "Es Teh", 5_000);

    let body = json!({
        "userLocation": { "lat": 0.0, "long": 0.0 },
        "orders": [
            {
                "merchantId": a.id.as_str(),
                "isStartingPoint": true,
                "items": [{ "itemId": item_a.id.as_str(), "quantity": 2 }]
            },
            {
                "merchantId": b.id.as_str(),
                "isStartingPoint": false,
                "items": [{ "itemId": item_b.id.as_str(), "quantity": 1 }]
            }
        ]
    });

    let catalog = MemoryCatalog::new()
        .with_merchant(a, vec![item_a])
        .with_merchant(b, vec![item_b]);
    (catalog, body)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// ============================================================================
// GET /merchants/nearby
// ============================================================================

#[tokio::test]
async fn test_nearby_requires_a_parseable_coordinate() {
    let (catalog, _) = two_merchant_world();
    let app = app_with(catalog);

    let (status, body) = send(&app, get("/merchants/nearby?coordinate=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);

    let (status, _) = send(&app, get("/merchants/nearby?coordinate=1.0,2.0,3.0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/merchants/nearby")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_ranks_by_distance_with_default_limit() {
    let (catalog, _) = two_merchant_world();
    let app = app_with(catalog);

    let (status, body) = send(&app, get("/merchants/nearby?coordinate=0.0,0.0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["limit"], 5);
    assert_eq!(body["meta"]["offset"], 0);
    assert_eq!(body["meta"]["total"], 2);

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["merchant"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Warung A", "Warung B"]);

    // Items are embedded, and the wire names are the public contract
    assert_eq!(body["data"][0]["items"][0]["name"], "Nasi Goreng");
    assert!(body["data"][0]["merchant"]["merchantId"].is_string());
}

#[tokio::test]
async fn test_nearby_total_ignores_pagination() {
    let (catalog, _) = two_merchant_world();
    let app = app_with(catalog);

    let (status, body) =
        send(&app, get("/merchants/nearby?coordinate=0.0,0.0&limit=1&offset=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["merchant"]["name"], "Warung B");
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn test_nearby_far_away_is_empty_not_an_error() {
    let (catalog, _) = two_merchant_world();
    let app = app_with(catalog);

    let (status, body) = send(&app, get("/merchants/nearby?coordinate=48.85,2.35")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["total"], 0);
}

// ============================================================================
// POST /orders/estimate
// ============================================================================

#[tokio::test]
async fn test_estimate_prices_and_times_the_cart() {
    let (catalog, body) = two_merchant_world();
    let app = app_with(catalog);

    let (status, response) = send(&app, post_json("/orders/estimate", &body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["totalPrice"], 25_000);
    // Tour A -> B -> user is 3.33585 km at 2/3 km/min, floored
    assert_eq!(response["estimatedDeliveryTimeInMinutes"], 5);
    assert!(response["calculatedEstimateId"].is_string());
}

#[tokio::test]
async fn test_estimate_rejects_double_starting_point() {
    let (catalog, mut body) = two_merchant_world();
    let app = app_with(catalog);

    body["orders"][1]["isStartingPoint"] = json!(true);
    let (status, response) = send(&app, post_json("/orders/estimate", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["statusCode"], 400);
}

#[tokio::test]
async fn test_estimate_rejects_unknown_merchant_as_not_found() {
    let (catalog, mut body) = two_merchant_world();
    let app = app_with(catalog);

    body["orders"][0]["merchantId"] = json!(MerchantId::generate().as_str().to_owned());
    let (status, _) = send(&app, post_json("/orders/estimate", &body, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_estimate_rejects_malformed_id_as_not_found() {
    let (catalog, mut body) = two_merchant_world();
    let app = app_with(catalog);

    body["orders"][0]["items"][0]["itemId"] = json!("not-a-ulid");
    let (status, _) = send(&app, post_json("/orders/estimate", &body, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_estimate_rejects_empty_items() {
    let (catalog, mut body) = two_merchant_world();
    let app = app_with(catalog);

    body["orders"][0]["items"] = json!([]);
    let (status, _) = send(&app, post_json("/orders/estimate", &body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// POST /orders + GET /orders
// ============================================================================

#[tokio::test]
async fn test_order_flow_redeems_exactly_once() {
    let (catalog, body) = two_merchant_world();
    let app = app_with(catalog);
    let token = issue_token(TOKEN_SECRET, "ayu", 3600).unwrap();

    let (_, estimate) = send(&app, post_json("/orders/estimate", &body, None)).await;
    let order_body = json!({
        "calculatedEstimateId": estimate["calculatedEstimateId"]
    });

    let (status, response) =
        send(&app, post_json("/orders", &order_body, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(response["orderId"].is_string());

    // The quote is consumed; a second redemption finds nothing
    let (status, response) =
        send(&app, post_json("/orders", &order_body, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["statusCode"], 404);
}

#[tokio::test]
async fn test_order_requires_authentication() {
    let (catalog, body) = two_merchant_world();
    let app = app_with(catalog);

    let (_, estimate) = send(&app, post_json("/orders/estimate", &body, None)).await;
    let order_body = json!({
        "calculatedEstimateId": estimate["calculatedEstimateId"]
    });

    let (status, _) = send(&app, post_json("/orders", &order_body, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        post_json("/orders", &order_body, Some("not-a-real-token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_estimate_id_is_not_found() {
    let (catalog, _) = two_merchant_world();
    let app = app_with(catalog);
    let token = issue_token(TOKEN_SECRET, "ayu", 3600).unwrap();

    let order_body = json!({ "calculatedEstimateId": "01ARZ3NDEKTSV4RRFFQ69G5FAV" });
    let (status, _) = send(&app, post_json("/orders", &order_body, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_lists_the_placed_order() {
    let (catalog, body) = two_merchant_world();
    let app = app_with(catalog);
    let token = issue_token(TOKEN_SECRET, "ayu", 3600).unwrap();

    let (_, estimate) = send(&app, post_json("/orders/estimate", &body, None)).await;
    let order_body = json!({
        "calculatedEstimateId": estimate["calculatedEstimateId"]
    });
    let (status, placed) = send(&app, post_json("/orders", &order_body, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .uri("/orders")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, history) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["orderId"], placed["orderId"]);
    // Two merchants in the cart, grouped separately
    assert_eq!(entries[0]["orders"].as_array().unwrap().len(), 2);
}
