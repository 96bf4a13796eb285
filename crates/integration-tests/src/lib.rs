//! Integration tests for Pronto.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations + seed
//! cargo run -p pronto-cli -- migrate
//! cargo run -p pronto-cli -- seed
//!
//! # Start the server
//! cargo run -p pronto-server
//!
//! # Run the suites (ignored by default)
//! cargo test -p pronto-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `PRONTO_BASE_URL` - server under test (default: `http://localhost:8080`)
//! - `PRONTO_TOKEN_SECRET` - must match the server's signing secret

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

/// Base URL for the server under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("PRONTO_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

#[derive(Serialize)]
struct Claims {
    username: String,
    exp: i64,
}

/// Mint a bearer token the server under test will accept.
///
/// # Panics
///
/// Panics if `PRONTO_TOKEN_SECRET` is unset or signing fails; the suites
/// cannot run without it.
#[must_use]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub fn bearer_token(username: &str) -> String {
    let secret = std::env::var("PRONTO_TOKEN_SECRET")
        .expect("PRONTO_TOKEN_SECRET must match the server under test");
    let claims = Claims {
        username: username.to_owned(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}
