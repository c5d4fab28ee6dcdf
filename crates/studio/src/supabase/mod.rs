//! Supabase Auth integration.
//!
//! Resolves access tokens with `GET {SUPABASE_URL}/auth/v1/user`. Resolved
//! users are cached for a minute so a burst of studio requests costs one
//! lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use fitting_room_core::UserId;

use crate::config::SupabaseConfig;
use crate::models::AuthenticatedUser;
use crate::services::{AuthError, Authenticator};

const TOKEN_CACHE_TTL: Duration = Duration::from_secs(60);
const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Supabase Auth client.
#[derive(Clone)]
pub struct SupabaseAuth {
    inner: Arc<SupabaseAuthInner>,
}

struct SupabaseAuthInner {
    client: reqwest::Client,
    user_endpoint: Url,
    anon_key: String,
    cache: Cache<String, AuthenticatedUser>,
}

/// The fields of the `/auth/v1/user` response we use.
#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: uuid::Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<SupabaseUser> for AuthenticatedUser {
    fn from(user: SupabaseUser) -> Self {
        Self {
            id: UserId::new(user.id),
            email: user.email.filter(|email| !email.is_empty()),
        }
    }
}

impl SupabaseAuth {
    /// Create a new Supabase Auth client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unavailable` if the project URL cannot be joined
    /// with the auth path or the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, AuthError> {
        let user_endpoint = config
            .url
            .join("auth/v1/user")
            .map_err(|e| AuthError::Unavailable(format!("invalid SUPABASE_URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .time_to_live(TOKEN_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseAuthInner {
                client,
                user_endpoint,
                anon_key: config.anon_key.expose_secret().to_string(),
                cache,
            }),
        })
    }

    #[instrument(skip(self, token))]
    async fn fetch_user(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .inner
            .client
            .get(self.inner.user_endpoint.clone())
            .bearer_auth(token)
            .header("apikey", &self.inner.anon_key)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            warn!(status = %status, "Supabase auth lookup failed");
            return Err(AuthError::Unavailable(format!("status {status}")));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        debug!(user_id = %user.id, "Resolved access token");
        Ok(user.into())
    }
}

#[async_trait]
impl Authenticator for SupabaseAuth {
    async fn user_for_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(user) = self.inner.cache.get(token).await {
            return Ok(user);
        }

        let user = self.fetch_user(token).await?;
        self.inner
            .cache
            .insert(token.to_string(), user.clone())
            .await;
        Ok(user)
    }
}
