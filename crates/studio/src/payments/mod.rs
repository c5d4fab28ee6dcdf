//! Credit purchases through Dodo Payments.
//!
//! - [`PaymentsClient`] creates hosted checkout sessions for a credit package.
//! - [`WebhookVerifier`] checks Standard Webhooks signatures on payment
//!   notifications; [`WebhookEvent`] extracts the credit grant from a
//!   completed checkout.
//! - [`PaymentLedger`] records deliveries so a retried webhook is applied
//!   once.

pub mod checkout;
pub mod error;
pub mod webhook;

use async_trait::async_trait;

use fitting_room_core::CreditBalance;

use crate::services::StoreError;

pub use checkout::{CheckoutSession, PaymentsClient};
pub use error::PaymentError;
pub use webhook::{CreditGrant, WebhookEvent, WebhookHeaders, WebhookVerifier};

/// What recording a webhook did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// This `webhook-id` was already applied.
    Duplicate,
    /// Recorded; the event grants nothing.
    Recorded,
    /// Recorded and the user's balance topped up.
    Credited(CreditBalance),
}

/// Idempotent bookkeeping for verified deliveries.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Record `webhook_id` and apply `grant`, both or neither.
    async fn apply_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        grant: Option<CreditGrant>,
    ) -> Result<WebhookOutcome, StoreError>;
}

/// Everything the payment routes need. Absent when payments are not
/// configured.
pub struct Payments {
    pub checkout: PaymentsClient,
    pub verifier: WebhookVerifier,
    pub ledger: std::sync::Arc<dyn PaymentLedger>,
}
