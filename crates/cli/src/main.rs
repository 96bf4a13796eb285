//! Pronto CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pronto-cli migrate
//!
//! # Seed the catalog with demo merchants and products
//! pronto-cli seed
//!
//! # Mint a development bearer token
//! pronto-cli token -u ayu
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with demo data
//! - `token` - Mint a development bearer token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pronto-cli")]
#[command(author, version, about = "Pronto CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with demo merchants and products
    Seed,
    /// Mint a development bearer token
    Token {
        /// Username to embed in the token
        #[arg(short, long)]
        username: String,

        /// Token lifetime in seconds
        #[arg(short, long, default_value = "86400")]
        ttl: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Token { username, ttl } => commands::token::mint(&username, ttl)?,
    }
    Ok(())
}
