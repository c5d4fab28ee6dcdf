//! Error types for the Gemini API client.

use thiserror::Error;

use crate::services::GenerationError;

/// Errors that can occur when talking to the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gemini returned an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A remote image could not be downloaded for inlining.
    #[error("failed to fetch image {url}: status {status}")]
    ImageFetch {
        /// Image URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// The API key cannot be sent as a header.
    #[error("invalid API key header")]
    InvalidApiKey,
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Parse(message) => Self::Malformed(message),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Error body returned by the Gemini API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_error_display() {
        let err = GeminiError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = GeminiError::Api {
            status: 400,
            message: "Image too large".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): Image too large");
    }

    #[test]
    fn test_parse_errors_are_malformed() {
        let err = GenerationError::from(GeminiError::Parse("eof".to_string()));
        assert_eq!(err, GenerationError::Malformed("eof".to_string()));

        let err = GenerationError::from(GeminiError::RateLimited(5));
        assert!(matches!(err, GenerationError::Transport(_)));
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.code, Some(400));
        assert_eq!(response.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }
}
