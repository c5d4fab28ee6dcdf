//! Payment error types.

use thiserror::Error;

/// Errors from checkout creation and webhook handling.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payments are not configured on this deployment.
    #[error("payments are not configured")]
    NotConfigured,

    /// No credit package of this size.
    #[error("unknown credit package: {0}")]
    UnknownPackage(u32),

    /// Checkout needs the buyer's email.
    #[error("an email address is required for checkout")]
    MissingEmail,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dodo returned an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Failed to parse a checkout response.
    #[error("parse error: {0}")]
    Parse(String),

    /// A verified webhook body that is not an event.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Webhook signature, timestamp or secret did not check out.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// A completed checkout without usable `userId`/`creditAmount` metadata.
    #[error("invalid webhook metadata: {0}")]
    InvalidMetadata(String),
}
