//! Integration tests for Fitting Room.
//!
//! The studio router is driven in-process with `tower::ServiceExt::oneshot`
//! over in-memory fakes of the generator, the stores, the authenticator and
//! the payment ledger. No database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fitting-room-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use fitting_room_core::UserId;
use fitting_room_studio::config::PaymentsConfig;
use fitting_room_studio::models::AuthenticatedUser;
use fitting_room_studio::payments::{PaymentLedger, Payments, PaymentsClient, WebhookVerifier};
use fitting_room_studio::routes;
use fitting_room_studio::services::testing::{
    MemoryCredits, MemoryLibrary, MemoryPayments, ScriptedGenerator, StaticAuthenticator,
    StaticSuggester,
};
use fitting_room_studio::services::{
    CreditsStore, ImageGenerator, LibraryStore, OutfitSuggester, Services, SessionRegistry,
};
use fitting_room_studio::state::AppState;

/// Token accepted for [`TestApp::user`].
pub const TOKEN: &str = "test-token";

/// Webhook secret shared by the app and [`TestApp::sign`].
pub const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

/// The full router over fakes, plus handles to each fake.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub user: AuthenticatedUser,
    pub generator: Arc<ScriptedGenerator>,
    pub credits: Arc<MemoryCredits>,
    pub library: Arc<MemoryLibrary>,
    pub payments: Arc<MemoryPayments>,
    signer: WebhookVerifier,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The error toast's message, if the body carries one.
    #[must_use]
    pub fn notice_message(&self) -> Option<&str> {
        self.body.pointer("/notice/message").and_then(Value::as_str)
    }
}

impl TestApp {
    /// A signed-in user with `credits` credits and a stylist that suggests
    /// `suggested`.
    pub fn new(credits: u32, suggested: &[&str]) -> Self {
        let generator = Arc::new(ScriptedGenerator::new());
        let credits = Arc::new(MemoryCredits::new(credits));
        let library = Arc::new(MemoryLibrary::new());
        let payments = Arc::new(MemoryPayments::new(Arc::clone(&credits)));

        let services = Services {
            generator: Arc::clone(&generator) as Arc<dyn ImageGenerator>,
            suggester: Arc::new(StaticSuggester::new(suggested)) as Arc<dyn OutfitSuggester>,
            credits: Arc::clone(&credits) as Arc<dyn CreditsStore>,
            library: Arc::clone(&library) as Arc<dyn LibraryStore>,
        };
        let sessions = SessionRegistry::new(services, Duration::from_secs(60));

        let user = AuthenticatedUser {
            id: UserId::generate(),
            email: Some("shopper@example.com".to_string()),
        };
        let authenticator = StaticAuthenticator::new().with_user(TOKEN, user.clone());

        let config = payments_config();
        let secret = SecretString::from(WEBHOOK_SECRET);
        let app_payments = Payments {
            checkout: PaymentsClient::new(&config).expect("payments client"),
            verifier: WebhookVerifier::new(&secret).expect("verifier"),
            ledger: Arc::clone(&payments) as Arc<dyn PaymentLedger>,
        };

        let state = AppState::new(sessions, Arc::new(authenticator), Some(app_payments), None);

        Self {
            router: routes::app(state.clone()),
            state,
            user,
            generator,
            credits,
            library,
            payments,
            signer: WebhookVerifier::new(&secret).expect("signer"),
        }
    }

    /// Send a request as the signed-in user.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.request(method, uri, Some(TOKEN), body).await
    }

    /// Send a request with an explicit (or no) bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.send(request).await
    }

    /// Deliver a webhook body, signed now unless `signature` is given.
    pub async fn deliver_webhook(
        &self,
        webhook_id: &str,
        body: &Value,
        signature: Option<&str>,
    ) -> TestResponse {
        let payload = body.to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = match signature {
            Some(signature) => signature.to_string(),
            None => self
                .signer
                .sign(webhook_id, &timestamp, payload.as_bytes())
                .expect("sign"),
        };

        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhooks/payments")
            .header(header::CONTENT_TYPE, "application/json")
            .header("webhook-id", webhook_id)
            .header("webhook-timestamp", timestamp)
            .header("webhook-signature", signature)
            .body(Body::from(payload))
            .expect("request");

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// A completed-checkout event granting `credits` to `user_id`.
#[must_use]
pub fn checkout_completed(user_id: UserId, credits: u32) -> Value {
    serde_json::json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "metadata": {
                    "userId": user_id.to_string(),
                    "creditAmount": credits.to_string(),
                }
            }
        }
    })
}

fn payments_config() -> PaymentsConfig {
    PaymentsConfig {
        api_key: SecretString::from("test_dodo_key_for_integration"),
        webhook_key: SecretString::from(WEBHOOK_SECRET),
        api_base_url: Url::parse("https://test.dodopayments.com/").expect("url"),
        return_url: Url::parse("https://studio.example.com/credits").expect("url"),
        product_ids: HashMap::from([
            (10, "pdt_10".to_string()),
            (50, "pdt_50".to_string()),
            (100, "pdt_100".to_string()),
        ]),
    }
}
