//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StudioConfig;
use crate::db::{PgCreditsStore, PgLibraryStore, PgPaymentLedger};
use crate::gemini::{GeminiClient, GeminiError};
use crate::payments::{PaymentError, Payments, PaymentsClient, WebhookVerifier};
use crate::services::{
    AuthError, Authenticator, CreditsStore, ImageGenerator, LibraryStore, OutfitSuggester,
    Services, SessionRegistry,
};
use crate::supabase::SupabaseAuth;

/// Error wiring the external clients at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("gemini client: {0}")]
    Gemini(#[from] GeminiError),
    #[error("supabase client: {0}")]
    Auth(#[from] AuthError),
    #[error("payments client: {0}")]
    Payments(#[from] PaymentError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    sessions: SessionRegistry,
    authenticator: Arc<dyn Authenticator>,
    payments: Option<Payments>,
    pool: Option<PgPool>,
}

impl AppState {
    /// Assemble state from already-built parts.
    ///
    /// Without a pool, readiness always succeeds. Without payments, the
    /// checkout and webhook routes answer 503.
    #[must_use]
    pub fn new(
        sessions: SessionRegistry,
        authenticator: Arc<dyn Authenticator>,
        payments: Option<Payments>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                sessions,
                authenticator,
                payments,
                pool,
            }),
        }
    }

    /// Wire Gemini, Supabase, Dodo and the Postgres stores from config.
    ///
    /// # Errors
    ///
    /// Returns an error if any client cannot be built from its config.
    pub fn from_config(config: &StudioConfig, pool: PgPool) -> Result<Self, StateError> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        let services = Services {
            generator: Arc::clone(&gemini) as Arc<dyn ImageGenerator>,
            suggester: gemini as Arc<dyn OutfitSuggester>,
            credits: Arc::new(PgCreditsStore::new(pool.clone())) as Arc<dyn CreditsStore>,
            library: Arc::new(PgLibraryStore::new(pool.clone())) as Arc<dyn LibraryStore>,
        };
        let sessions = SessionRegistry::new(services, config.session_idle);
        let authenticator = Arc::new(SupabaseAuth::new(&config.supabase)?);

        let payments = config
            .payments()
            .map(|payments| -> Result<Payments, PaymentError> {
                Ok(Payments {
                    checkout: PaymentsClient::new(payments)?,
                    verifier: WebhookVerifier::new(&payments.webhook_key)?,
                    ledger: Arc::new(PgPaymentLedger::new(pool.clone())),
                })
            })
            .transpose()?;

        Ok(Self::new(sessions, authenticator, payments, Some(pool)))
    }

    /// Live studio sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    /// Resolves bearer tokens to users.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.inner.authenticator.as_ref()
    }

    /// Checkout and webhook handling, if configured.
    #[must_use]
    pub fn payments(&self) -> Option<&Payments> {
        self.inner.payments.as_ref()
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
