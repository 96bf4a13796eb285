//! Mint a development bearer token.
//!
//! Signs with `PRONTO_TOKEN_SECRET`, so the token is accepted by a server
//! running with the same secret. Development convenience only; real tokens
//! come from the authentication service.

use super::CommandError;
use pronto_server::middleware::auth::issue_token;

/// Print a bearer token for `username` valid for `ttl` seconds.
///
/// # Errors
///
/// Returns an error if the secret is missing or signing fails.
#[allow(clippy::print_stdout)] // the token is the command's output
pub fn mint(username: &str, ttl: i64) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();
    let secret = std::env::var("PRONTO_TOKEN_SECRET")
        .map_err(|_| CommandError::MissingEnvVar("PRONTO_TOKEN_SECRET"))?;

    let token = issue_token(&secret, username, ttl)?;
    println!("{token}");
    Ok(())
}
