//! CLI command implementations.

pub mod credits;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] fitting_room_studio::db::RepositoryError),
}

/// Connect to the studio database named by `STUDIO_DATABASE_URL`
/// (fallback `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STUDIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("STUDIO_DATABASE_URL"))?;

    tracing::info!("Connecting to studio database...");
    Ok(fitting_room_studio::db::create_pool(&SecretString::from(database_url)).await?)
}
