//! CLI subcommands.
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honoured) and talks
//! to the database through the API crate's repositories.

pub mod migrate;
pub mod tokens;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use emporium_api::db::{self, RepositoryError};

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository query failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

/// Connect to the database named by `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CliError::MissingEnvVar` if the variable is unset and
/// `CliError::Database` if the connection fails.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
