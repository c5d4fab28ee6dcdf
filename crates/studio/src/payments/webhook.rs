//! Payment webhooks: Standard Webhooks signature checks and event parsing.
//!
//! A delivery carries three headers:
//!
//! - `webhook-id` - unique per message, reused across retries
//! - `webhook-timestamp` - unix seconds at send time
//! - `webhook-signature` - space-separated `v1,<base64>` signatures
//!
//! The signed content is `"{id}.{timestamp}.{body}"`, HMAC-SHA256 keyed by
//! the base64-decoded secret that follows `whsec_`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use fitting_room_core::UserId;

use super::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
const TOLERANCE_SECS: i64 = 300;
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// The three signature headers of a delivery.
#[derive(Debug, Clone, Copy)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verifies webhook signatures with the endpoint secret.
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_<base64>` secret. A secret without the
    /// prefix is taken as base64 as-is.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` if the secret is not base64.
    pub fn new(secret: &SecretString) -> Result<Self, PaymentError> {
        let secret = secret.expose_secret();
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| PaymentError::InvalidSignature("webhook secret is not base64".to_string()))?;
        Ok(Self { key })
    }

    /// Check a delivery against the current time.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` for a missing header, a
    /// timestamp outside the five-minute window, or no matching signature.
    pub fn verify(&self, headers: &WebhookHeaders<'_>, body: &[u8]) -> Result<(), PaymentError> {
        self.verify_at(headers, body, Utc::now())
    }

    /// [`verify`](Self::verify) with an explicit clock.
    ///
    /// # Errors
    ///
    /// As [`verify`](Self::verify).
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders<'_>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        if headers.id.is_empty() || headers.timestamp.is_empty() || headers.signature.is_empty() {
            return Err(PaymentError::InvalidSignature(
                "missing webhook headers".to_string(),
            ));
        }

        let ts: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| PaymentError::InvalidSignature("invalid timestamp".to_string()))?;
        if (now.timestamp() - ts).abs() > TOLERANCE_SECS {
            return Err(PaymentError::InvalidSignature(
                "timestamp outside tolerance".to_string(),
            ));
        }

        let mac = self.mac(headers.id, headers.timestamp, body)?;
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, signature)| STANDARD.decode(signature).ok())
            .any(|signature| mac.clone().verify_slice(&signature).is_ok());

        if !matched {
            return Err(PaymentError::InvalidSignature(
                "signature mismatch".to_string(),
            ));
        }

        debug!(webhook_id = headers.id, "Webhook signature verified");
        Ok(())
    }

    /// Produce a `v1,<base64>` signature. Used to sign test deliveries.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidSignature` if the key is unusable.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<String, PaymentError> {
        let mac = self.mac(id, timestamp, body)?;
        Ok(format!(
            "{SIGNATURE_VERSION},{}",
            STANDARD.encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, PaymentError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PaymentError::InvalidSignature(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

/// A verified webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Credits to add for a completed checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditGrant {
    pub user_id: UserId,
    pub credits: u32,
}

impl WebhookEvent {
    /// Parse a verified body.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidPayload` for a body that is not an event.
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(body).map_err(|e| PaymentError::InvalidPayload(e.to_string()))
    }

    /// The credit grant carried by a completed checkout. Other event types
    /// grant nothing.
    ///
    /// Metadata is read from `data.object.metadata`, falling back to
    /// `data.metadata`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidMetadata` for a completed checkout
    /// without a valid `userId` and a positive `creditAmount`.
    pub fn credit_grant(&self) -> Result<Option<CreditGrant>, PaymentError> {
        if self.event_type != CHECKOUT_COMPLETED {
            return Ok(None);
        }

        let metadata = self
            .data
            .pointer("/object/metadata")
            .or_else(|| self.data.get("metadata"))
            .ok_or_else(|| PaymentError::InvalidMetadata("no metadata".to_string()))?;

        let user_id = metadata
            .get("userId")
            .and_then(serde_json::Value::as_str)
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or_else(|| PaymentError::InvalidMetadata("userId".to_string()))?;

        let credits = match metadata.get("creditAmount") {
            Some(serde_json::Value::String(amount)) => amount.trim().parse::<u32>().ok(),
            Some(serde_json::Value::Number(amount)) => {
                amount.as_u64().and_then(|n| u32::try_from(n).ok())
            }
            _ => None,
        }
        .filter(|credits| *credits > 0)
        .ok_or_else(|| PaymentError::InvalidMetadata("creditAmount".to_string()))?;

        Ok(Some(CreditGrant { user_id, credits }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(&SecretString::from(SECRET)).expect("verifier")
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp")
    }

    #[test]
    fn test_accepts_valid_signature() {
        let verifier = verifier();
        let body = br#"{"type":"payment.succeeded","data":{}}"#;
        let signature = verifier.sign("msg_1", "1700000000", body).expect("sign");
        let headers = WebhookHeaders {
            id: "msg_1",
            timestamp: "1700000000",
            signature: &format!("v1,bogus {signature}"),
        };

        verifier.verify_at(&headers, body, now()).expect("valid");
    }

    #[test]
    fn test_rejects_tampered_body() {
        let verifier = verifier();
        let signature = verifier.sign("msg_1", "1700000000", b"{}").expect("sign");
        let headers = WebhookHeaders {
            id: "msg_1",
            timestamp: "1700000000",
            signature: &signature,
        };

        let err = verifier
            .verify_at(&headers, b"{\"x\":1}", now())
            .expect_err("tampered");
        assert!(matches!(err, PaymentError::InvalidSignature(_)));
    }

    #[test]
    fn test_rejects_old_timestamp() {
        let verifier = verifier();
        let signature = verifier.sign("msg_1", "1699999000", b"{}").expect("sign");
        let headers = WebhookHeaders {
            id: "msg_1",
            timestamp: "1699999000",
            signature: &signature,
        };

        let err = verifier.verify_at(&headers, b"{}", now()).expect_err("old");
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_rejects_missing_headers() {
        let headers = WebhookHeaders {
            id: "",
            timestamp: "1700000000",
            signature: "v1,abc",
        };
        assert!(verifier().verify_at(&headers, b"{}", now()).is_err());
    }

    #[test]
    fn test_credit_grant_from_completed_checkout() {
        let user_id = UserId::generate();
        let body = format!(
            r#"{{"type":"checkout.session.completed","data":{{"object":{{"metadata":{{"userId":"{user_id}","creditAmount":"50"}}}}}}}}"#
        );
        let event = WebhookEvent::parse(body.as_bytes()).expect("event");

        let grant = event.credit_grant().expect("grant").expect("some");
        assert_eq!(grant, CreditGrant { user_id, credits: 50 });
    }

    #[test]
    fn test_other_events_grant_nothing() {
        let event = WebhookEvent::parse(br#"{"type":"payment.failed","data":{}}"#).expect("event");
        assert_eq!(event.credit_grant().expect("ok"), None);
    }

    #[test]
    fn test_rejects_non_event_body() {
        assert!(matches!(
            WebhookEvent::parse(b"[1, 2]"),
            Err(PaymentError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_invalid_metadata() {
        let event = WebhookEvent::parse(
            br#"{"type":"checkout.session.completed","data":{"metadata":{"userId":"not-a-uuid","creditAmount":"10"}}}"#,
        )
        .expect("event");
        assert!(matches!(
            event.credit_grant(),
            Err(PaymentError::InvalidMetadata(_))
        ));

        let event = WebhookEvent::parse(
            br#"{"type":"checkout.session.completed","data":{"metadata":{"userId":"6f1c2e9a-3b7d-4c1e-9a2b-1d2e3f4a5b6c","creditAmount":"0"}}}"#,
        )
        .expect("event");
        assert!(event.credit_grant().is_err());
    }
}
