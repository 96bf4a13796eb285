//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod token;

use secrecy::SecretString;

/// Errors shared by the database-touching commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0} not set")]
    MissingEnvVar(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Read the database URL from the environment (`.env` honored).
pub(crate) fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    std::env::var("PRONTO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("PRONTO_DATABASE_URL"))
}
