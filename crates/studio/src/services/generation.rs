//! Seams to the generative model.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use fitting_room_core::{GarmentCategory, GarmentId, ImageRef, WardrobeItem};

/// Why a generation produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Refused by the model's safety filters.
    #[error("request was blocked: {0}")]
    Blocked(String),

    /// The model answered without an image, optionally with text.
    #[error("the model did not return an image")]
    NoImage(Option<String>),

    /// The response could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Network failure, timeout or server error. Retriable.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Turns input images plus an instruction into a new image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image. `images` are sent in order, before the prompt.
    async fn generate(&self, images: &[ImageRef], prompt: &str)
    -> Result<ImageRef, GenerationError>;
}

/// What the stylist sees of a wardrobe item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionItem {
    pub id: GarmentId,
    pub name: String,
    pub category: GarmentCategory,
}

impl From<&WardrobeItem> for SuggestionItem {
    fn from(item: &WardrobeItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            category: item.category,
        }
    }
}

/// Picks wardrobe items matching a theme.
#[async_trait]
pub trait OutfitSuggester: Send + Sync {
    /// Suggested item IDs, in application order. An empty list is a valid
    /// answer.
    async fn suggest(
        &self,
        items: &[SuggestionItem],
        theme: &str,
    ) -> Result<Vec<GarmentId>, GenerationError>;
}
