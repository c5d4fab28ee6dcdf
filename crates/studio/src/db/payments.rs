//! Idempotent application of payment webhooks.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use super::RepositoryError;
use super::profiles;
use crate::payments::{CreditGrant, PaymentLedger, WebhookOutcome};
use crate::services::StoreError;

/// Repository for payment webhook bookkeeping.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a delivered webhook and apply its grant, once per
    /// `webhook_id`. The record and the top-up commit together.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails; nothing
    /// is recorded in that case so the provider's retry applies it.
    #[instrument(skip(self, grant))]
    pub async fn apply_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        grant: Option<CreditGrant>,
    ) -> Result<WebhookOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let credits = grant
            .map(|g| i32::try_from(g.credits))
            .transpose()
            .map_err(|_| RepositoryError::Conflict("credit amount too large".to_string()))?;

        let inserted = sqlx::query(
            r"
            INSERT INTO payment_webhooks (webhook_id, event_type, user_id, credits)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (webhook_id) DO NOTHING
            ",
        )
        .bind(webhook_id)
        .bind(event_type)
        .bind(grant.map(|g| g.user_id))
        .bind(credits)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            info!("Duplicate webhook delivery ignored");
            return Ok(WebhookOutcome::Duplicate);
        }

        let outcome = match grant {
            Some(grant) => {
                let balance = profiles::add_credits(&mut *tx, grant.user_id, grant.credits).await?;
                info!(
                    user_id = %grant.user_id,
                    credits = grant.credits,
                    balance = %balance,
                    "Credits added from payment"
                );
                WebhookOutcome::Credited(balance)
            }
            None => WebhookOutcome::Recorded,
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

/// [`PaymentLedger`] backed by the `payment_webhooks` table.
#[derive(Clone)]
pub struct PgPaymentLedger {
    pool: PgPool,
}

impl PgPaymentLedger {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentLedger for PgPaymentLedger {
    async fn apply_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        grant: Option<CreditGrant>,
    ) -> Result<WebhookOutcome, StoreError> {
        Ok(PaymentRepository::new(&self.pool)
            .apply_webhook(webhook_id, event_type, grant)
            .await?)
    }
}
