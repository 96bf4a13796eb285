//! Authentication extractor.
//!
//! Identity is supplied by an external authentication layer in the form of
//! an HS256 bearer token; this module only verifies it. Handlers that need
//! the caller's identity take an [`AuthenticatedUser`] parameter.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The caller's username.
    pub username: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn place_order(
///     user: AuthenticatedUser,
/// ) -> impl IntoResponse {
///     format!("ordering as {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

        let key = DecodingKey::from_secret(state.config().token_secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| ApiError::Unauthorized(format!("invalid token: {e}")))?;

        Ok(Self {
            username: data.claims.username,
        })
    }
}

/// Issue a bearer token for `username`, valid for `ttl_secs` seconds.
///
/// Used by the CLI to mint development tokens and by the test suites; the
/// production issuer is the external authentication service.
///
/// # Errors
///
/// Returns an error if token signing fails.
pub fn issue_token(
    secret: &str,
    username: &str,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        username: username.to_owned(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
