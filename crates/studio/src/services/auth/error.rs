//! Authentication error types.

use thiserror::Error;

/// Errors from resolving a bearer token to a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// The identity provider rejected the token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The identity provider answered with something we could not read.
    #[error("unexpected auth response: {0}")]
    Malformed(String),

    /// The identity provider could not be reached.
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}
