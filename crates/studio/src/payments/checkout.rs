//! Hosted checkout sessions.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use fitting_room_core::CreditPackage;

use crate::config::PaymentsConfig;
use crate::models::AuthenticatedUser;

use super::error::PaymentError;

/// Dodo Payments API client.
#[derive(Clone)]
pub struct PaymentsClient {
    inner: Arc<PaymentsClientInner>,
}

struct PaymentsClientInner {
    client: reqwest::Client,
    checkouts_endpoint: Url,
    return_url: Url,
    product_ids: HashMap<u32, String>,
}

#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
    product_cart: Vec<CartItem<'a>>,
    customer: Customer<'a>,
    return_url: &'a str,
    metadata: CheckoutMetadata,
}

#[derive(Debug, Serialize)]
struct CartItem<'a> {
    product_id: &'a str,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    email: &'a str,
    name: &'a str,
}

/// Metadata echoed back in the completion webhook. Values must be strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutMetadata {
    user_id: String,
    credit_amount: String,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub session_id: Option<String>,
    pub checkout_url: String,
}

impl PaymentsClient {
    /// Create a new payments client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Parse` if the API key is not a valid header
    /// value or the base URL cannot be joined, and `PaymentError::Http` if
    /// the HTTP client cannot be built.
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|_| PaymentError::Parse("invalid API key header".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        let checkouts_endpoint = config
            .api_base_url
            .join("checkouts")
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(PaymentsClientInner {
                client,
                checkouts_endpoint,
                return_url: config.return_url.clone(),
                product_ids: config.product_ids.clone(),
            }),
        })
    }

    /// Start a checkout for a credit package.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::UnknownPackage` for a size with no package or
    /// product, `PaymentError::MissingEmail` if the user has no email, or
    /// an HTTP/API error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_checkout(
        &self,
        user: &AuthenticatedUser,
        credits: u32,
    ) -> Result<CheckoutSession, PaymentError> {
        let package = CreditPackage::find(credits).ok_or(PaymentError::UnknownPackage(credits))?;
        let product_id = self
            .inner
            .product_ids
            .get(&package.credits)
            .ok_or(PaymentError::UnknownPackage(credits))?;
        let email = user.email.as_deref().ok_or(PaymentError::MissingEmail)?;

        let request = CheckoutRequest {
            product_cart: vec![CartItem {
                product_id,
                quantity: 1,
            }],
            customer: Customer { email, name: email },
            return_url: self.inner.return_url.as_str(),
            metadata: CheckoutMetadata {
                user_id: user.id.to_string(),
                credit_amount: package.credits.to_string(),
            },
        };

        let response = self
            .inner
            .client
            .post(self.inner.checkouts_endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let session: CheckoutSession = serde_json::from_str(&body)
            .map_err(|e| PaymentError::Parse(format!("Failed to parse checkout session: {e}")))?;
        if session.checkout_url.is_empty() {
            return Err(PaymentError::Parse("checkout session has no URL".to_string()));
        }

        info!(credits, session_id = ?session.session_id, "Checkout session created");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitting_room_core::UserId;

    #[test]
    fn test_checkout_request_shape() {
        let user_id = UserId::generate();
        let request = CheckoutRequest {
            product_cart: vec![CartItem {
                product_id: "pdt_50",
                quantity: 1,
            }],
            customer: Customer {
                email: "ada@example.com",
                name: "ada@example.com",
            },
            return_url: "https://fitting.room/",
            metadata: CheckoutMetadata {
                user_id: user_id.to_string(),
                credit_amount: "50".to_string(),
            },
        };

        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["product_cart"][0]["product_id"], "pdt_50");
        assert_eq!(json["product_cart"][0]["quantity"], 1);
        assert_eq!(json["customer"]["name"], "ada@example.com");
        assert_eq!(json["metadata"]["creditAmount"], "50");
        assert_eq!(json["metadata"]["userId"], user_id.to_string());
    }

    #[test]
    fn test_checkout_session_deserialization() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{"session_id":"cks_123","checkout_url":"https://checkout.dodopayments.com/cks_123"}"#,
        )
        .expect("deserialize");
        assert_eq!(session.session_id.as_deref(), Some("cks_123"));
        assert!(session.checkout_url.ends_with("cks_123"));
    }
}
