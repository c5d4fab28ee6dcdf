//! Unified error handling for the studio API.
//!
//! Every error answers with `{"notice": {"level": "error", "message": ...}}`
//! so the client can show it as a toast.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use fitting_room_core::UserId;

use crate::db::RepositoryError;
use crate::models::Notice;
use crate::payments::PaymentError;
use crate::services::{AuthError, StoreError, StudioError};

/// Application-level error type for the studio API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A studio action did nothing.
    #[error("{0}")]
    Studio(#[from] StudioError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// A store behind a non-session route failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Bearer token missing, rejected, or not checkable.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout or webhook failure.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    notice: Notice,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Studio(err) => match err {
                StudioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                StudioError::InsufficientCredits(_) => StatusCode::PAYMENT_REQUIRED,
                StudioError::Busy | StudioError::NoModel => StatusCode::CONFLICT,
                StudioError::Blocked(_)
                | StudioError::NoImage(_)
                | StudioError::EmptySuggestion => StatusCode::UNPROCESSABLE_ENTITY,
                StudioError::Malformed(_) | StudioError::Transport(_) => StatusCode::BAD_GATEWAY,
                StudioError::Library(StoreError::NotFound) => StatusCode::NOT_FOUND,
                StudioError::Library(StoreError::Exhausted) => StatusCode::PAYMENT_REQUIRED,
                StudioError::Library(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(StoreError::NotFound) | Self::Database(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Database(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::Payment(err) => match err {
                PaymentError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                PaymentError::UnknownPackage(_)
                | PaymentError::MissingEmail
                | PaymentError::InvalidSignature(_)
                | PaymentError::InvalidPayload(_)
                | PaymentError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the user. Server-side details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Studio(err) => err.user_message(),
            Self::Store(StoreError::NotFound) | Self::Database(RepositoryError::NotFound) => {
                "That item no longer exists.".to_string()
            }
            Self::Database(_) | Self::Store(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            Self::Auth(AuthError::MissingToken | AuthError::InvalidToken) => {
                "Please sign in again.".to_string()
            }
            Self::Auth(_) => "Sign-in is unavailable right now. Please try again.".to_string(),
            Self::Payment(PaymentError::NotConfigured) => {
                "Purchasing credits is not available right now.".to_string()
            }
            Self::Payment(PaymentError::UnknownPackage(credits)) => {
                format!("There is no {credits}-credit package.")
            }
            Self::Payment(PaymentError::MissingEmail) => {
                "Your account needs an email address to check out.".to_string()
            }
            Self::Payment(
                PaymentError::InvalidSignature(_)
                | PaymentError::InvalidPayload(_)
                | PaymentError::InvalidMetadata(_),
            ) => "Invalid webhook.".to_string(),
            Self::Payment(_) => {
                "Failed to create checkout session. Please try again.".to_string()
            }
            Self::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Studio request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            notice: Notice::error(self.user_message()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_studio_error_status_codes() {
        assert_eq!(
            get_status(StudioError::InvalidInput("blank".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(StudioError::InsufficientCredits("out")),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(get_status(StudioError::Busy), StatusCode::CONFLICT);
        assert_eq!(
            get_status(StudioError::Blocked("SAFETY".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(StudioError::EmptySuggestion),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(StudioError::Transport("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(StudioError::Library(StoreError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_and_payment_status_codes() {
        assert_eq!(get_status(AuthError::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AuthError::Unavailable("down".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(PaymentError::NotConfigured),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(PaymentError::InvalidMetadata("userId".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("row 7".to_string()));
        assert!(!err.user_message().contains("row 7"));
    }
}
