//! Authentication extractor for the studio API.
//!
//! Every `/api/*` handler takes [`RequireUser`]. The bearer token is checked
//! with the configured [`Authenticator`](crate::services::Authenticator) on
//! each request; the Supabase client caches answers briefly.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use tracing::debug;

use crate::error::{AppError, set_sentry_user};
use crate::models::AuthenticatedUser;
use crate::services::{AuthError, bearer_token};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the header is missing or the token is refused, and
/// 502 when the identity provider cannot be reached.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> String {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let user = state.authenticator().user_for_token(token).await?;
        debug!(user_id = %user.id, "Authenticated request");
        set_sentry_user(user.id, user.email.as_deref());

        Ok(Self(user))
    }
}
