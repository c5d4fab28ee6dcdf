//! Studio action errors.

use thiserror::Error;

use fitting_room_core::{HistoryError, ImageRefError};

use super::generation::GenerationError;
use super::store::StoreError;
use crate::models::Notice;

/// Why a studio action did nothing.
///
/// No variant leaves state partially committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudioError {
    /// Another action is in flight for this session.
    #[error("a generation is already in progress")]
    Busy,

    /// No base model has been finalized yet.
    #[error("no model image")]
    NoModel,

    /// The local balance is zero. Carries the message for the action.
    #[error("insufficient credits")]
    InsufficientCredits(&'static str),

    /// Rejected before any credit check or remote call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The stylist returned no items for the theme.
    #[error("no outfit suggested for this theme")]
    EmptySuggestion,

    #[error("request was blocked: {0}")]
    Blocked(String),

    #[error("no image returned")]
    NoImage(Option<String>),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// A credits or library store failed.
    #[error("library error: {0}")]
    Library(#[from] StoreError),
}

impl StudioError {
    /// Short message for the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "Please wait for the current generation to finish.".to_string(),
            Self::NoModel => "Create your model first.".to_string(),
            Self::InsufficientCredits(message) => (*message).to_string(),
            Self::InvalidInput(message) => message.clone(),
            Self::EmptySuggestion => {
                "The AI couldn't create an outfit for that theme. Try another!".to_string()
            }
            Self::Blocked(reason) => format!(
                "Request was blocked. Reason: {reason}. Try a different image or instruction."
            ),
            Self::NoImage(Some(text)) => {
                format!("The AI model did not return an image. The model responded with text: \"{text}\"")
            }
            Self::NoImage(None) => "The AI model did not return an image. This can happen due to safety filters or if the request is too complex. Please try a different image.".to_string(),
            Self::Malformed(_) => {
                "The AI returned something unexpected. Please try again.".to_string()
            }
            Self::Transport(_) => {
                "The image service is unavailable right now. Please try again.".to_string()
            }
            Self::Library(StoreError::NotFound) => "That item no longer exists.".to_string(),
            Self::Library(_) => "Couldn't update your library. Please try again.".to_string(),
        }
    }

    /// The error as a toast.
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice::error(self.user_message())
    }
}

impl From<GenerationError> for StudioError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Blocked(reason) => Self::Blocked(reason),
            GenerationError::NoImage(text) => Self::NoImage(text),
            GenerationError::Malformed(msg) => Self::Malformed(msg),
            GenerationError::Transport(msg) => Self::Transport(msg),
        }
    }
}

impl From<HistoryError> for StudioError {
    fn from(err: HistoryError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ImageRefError> for StudioError {
    fn from(err: ImageRefError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_errors_map_one_to_one() {
        assert_eq!(
            StudioError::from(GenerationError::Blocked("SAFETY".to_string())),
            StudioError::Blocked("SAFETY".to_string())
        );
        assert_eq!(
            StudioError::from(GenerationError::Transport("timeout".to_string())),
            StudioError::Transport("timeout".to_string())
        );
    }

    #[test]
    fn test_user_messages() {
        assert!(
            StudioError::NoImage(Some("I can't".to_string()))
                .user_message()
                .contains("The model responded with text: \"I can't\"")
        );
        assert_eq!(
            StudioError::InsufficientCredits("You are out of credits to add a new garment.")
                .notice()
                .message,
            "You are out of credits to add a new garment."
        );
    }

    #[test]
    fn test_history_errors_are_invalid_input() {
        let err = StudioError::from(HistoryError::NothingToRemove);
        assert!(matches!(err, StudioError::InvalidInput(_)));
    }
}
