//! Bearer-token authentication.
//!
//! The studio does not issue sessions of its own. Every API request carries
//! the identity provider's access token, which an [`Authenticator`] turns
//! into an [`AuthenticatedUser`].

mod error;

pub use error::AuthError;

use async_trait::async_trait;

use crate::models::AuthenticatedUser;

/// Resolves access tokens to users.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The user the token belongs to.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] for a token the provider rejects; other
    /// variants when the provider cannot answer.
    async fn user_for_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
