//! Credit balances.
//!
//! A user's profile row is created lazily with [`NEW_USER_CREDITS`] the
//! first time their balance is read or topped up.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use fitting_room_core::{CreditBalance, UserId};

use super::RepositoryError;
use crate::services::{CreditsStore, StoreError};

/// Credits granted to a new user.
pub const NEW_USER_CREDITS: u32 = 10;

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance, creating the profile if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CreditBalance, RepositoryError> {
        let credits: i32 = sqlx::query_scalar(
            r"
            WITH inserted AS (
                INSERT INTO profiles (id, credits)
                VALUES ($1, $2)
                ON CONFLICT (id) DO NOTHING
                RETURNING credits
            )
            SELECT credits FROM inserted
            UNION ALL
            SELECT credits FROM profiles WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(CreditBalance::new(NEW_USER_CREDITS).to_stored())
        .fetch_one(self.pool)
        .await?;

        Ok(CreditBalance::from_stored(credits))
    }

    /// Overwrite the balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self))]
    pub async fn set_credits(
        &self,
        user_id: UserId,
        credits: CreditBalance,
    ) -> Result<CreditBalance, RepositoryError> {
        let credits: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE profiles
            SET credits = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING credits
            ",
        )
        .bind(user_id)
        .bind(credits.to_stored())
        .fetch_optional(self.pool)
        .await?;

        credits
            .map(CreditBalance::from_stored)
            .ok_or(RepositoryError::NotFound)
    }

    /// Spend one credit if the balance allows it. `None` means the balance
    /// was already zero (or the profile does not exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn decrement(&self, user_id: UserId) -> Result<Option<CreditBalance>, RepositoryError> {
        let credits: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE profiles
            SET credits = credits - 1, updated_at = NOW()
            WHERE id = $1 AND credits > 0
            RETURNING credits
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(credits.map(CreditBalance::from_stored))
    }

    /// Add purchased credits, creating the profile if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the amount does not fit the
    /// column, or `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn add_credits(
        &self,
        user_id: UserId,
        credits: u32,
    ) -> Result<CreditBalance, RepositoryError> {
        add_credits(self.pool, user_id, credits).await
    }
}

/// Top-up shared by the repository and the webhook transaction.
pub(super) async fn add_credits<'e, E>(
    executor: E,
    user_id: UserId,
    credits: u32,
) -> Result<CreditBalance, RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    let amount = i32::try_from(credits)
        .map_err(|_| RepositoryError::Conflict(format!("credit amount too large: {credits}")))?;

    let balance: i32 = sqlx::query_scalar(
        r"
        INSERT INTO profiles (id, credits)
        VALUES ($1, $2 + $3)
        ON CONFLICT (id) DO UPDATE
        SET credits = profiles.credits + $3, updated_at = NOW()
        RETURNING credits
        ",
    )
    .bind(user_id)
    .bind(CreditBalance::new(NEW_USER_CREDITS).to_stored())
    .bind(amount)
    .fetch_one(executor)
    .await?;

    Ok(CreditBalance::from_stored(balance))
}

/// [`CreditsStore`] backed by the `profiles` table.
#[derive(Clone)]
pub struct PgCreditsStore {
    pool: PgPool,
}

impl PgCreditsStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    const fn repo(&self) -> ProfileRepository<'_> {
        ProfileRepository::new(&self.pool)
    }
}

#[async_trait]
impl CreditsStore for PgCreditsStore {
    async fn get_credits(&self, user: UserId) -> Result<CreditBalance, StoreError> {
        Ok(self.repo().get_or_create(user).await?)
    }

    async fn set_credits(
        &self,
        user: UserId,
        credits: CreditBalance,
    ) -> Result<CreditBalance, StoreError> {
        Ok(self.repo().set_credits(user, credits).await?)
    }

    async fn decrement_credits(&self, user: UserId) -> Result<CreditBalance, StoreError> {
        self.repo()
            .decrement(user)
            .await?
            .ok_or(StoreError::Exhausted)
    }

    async fn add_credits(&self, user: UserId, credits: u32) -> Result<CreditBalance, StoreError> {
        Ok(self.repo().add_credits(user, credits).await?)
    }
}
