//! Database operations for the studio `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `profiles` - Credit balance per user (created on first use)
//! - `saved_models` - Finalized model images kept by the user
//! - `saved_outfits` - Saved looks (JSONB layers)
//! - `payment_webhooks` - Applied payment webhooks, for idempotency
//!
//! # Migrations
//!
//! Migrations are stored in `crates/studio/migrations/` and run via:
//! ```bash
//! cargo run -p fitting-room-cli -- migrate
//! ```

pub mod library;
pub mod payments;
pub mod profiles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::services::StoreError;

pub use library::{LibraryRepository, PgLibraryStore};
pub use payments::{PaymentRepository, PgPaymentLedger};
pub use profiles::{NEW_USER_CREDITS, PgCreditsStore, ProfileRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_store_errors() {
        assert_eq!(StoreError::from(RepositoryError::NotFound), StoreError::NotFound);
        assert!(matches!(
            StoreError::from(RepositoryError::DataCorruption("bad layers".to_string())),
            StoreError::Backend(_)
        ));
    }
}
