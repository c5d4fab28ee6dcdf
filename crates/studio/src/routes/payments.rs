//! Payment webhook.
//!
//! Dodo retries a delivery until it gets a 2xx, so a duplicate is answered
//! 200 and a delivery that can never succeed (bad signature or metadata) is
//! answered 400. Store failures answer 500 and the retry applies it later.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::payments::{PaymentError, WebhookEvent, WebhookHeaders, WebhookOutcome};
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// POST /webhooks/payments
///
/// # Errors
///
/// Returns `AppError` for an unverifiable delivery or a store failure.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let payments = state.payments().ok_or(PaymentError::NotConfigured)?;

    let delivery = WebhookHeaders {
        id: header(&headers, "webhook-id"),
        timestamp: header(&headers, "webhook-timestamp"),
        signature: header(&headers, "webhook-signature"),
    };
    payments.verifier.verify(&delivery, &body)?;

    let event = WebhookEvent::parse(&body)?;
    let grant = event.credit_grant()?;
    let outcome = payments
        .ledger
        .apply_webhook(delivery.id, &event.event_type, grant)
        .await?;

    info!(
        webhook_id = delivery.id,
        event_type = %event.event_type,
        outcome = ?outcome,
        "Payment webhook handled"
    );

    // A live session holds a local balance; pull the top-up into it.
    if let (WebhookOutcome::Credited(_), Some(grant)) = (outcome, grant) {
        if let Some(session) = state.sessions().get(grant.user_id).await {
            if let Err(e) = session.refresh_credits().await {
                warn!(user_id = %grant.user_id, error = %e, "Failed to refresh session credits");
            }
        }
    }

    Ok(StatusCode::OK)
}
