//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fr-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STUDIO_DATABASE_URL` - `PostgreSQL` connection string (fallback `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/studio/migrations/`:
//! ```text
//! migrations/
//! ├── 20250101000000_profiles.sql
//! ├── 20250101000001_library.sql
//! └── 20250101000002_payment_webhooks.sql
//! ```

use super::{CommandError, connect};

/// Run studio database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running studio migrations...");
    sqlx::migrate!("../studio/migrations").run(&pool).await?;

    tracing::info!("Studio migrations complete!");
    Ok(())
}
