//! Saved models and saved looks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::ImageRef;
use crate::outfit::{HistoryError, OutfitHistory, OutfitLayer};
use crate::types::{SavedModelId, SavedOutfitId, UserId};

/// A finalized model image the user kept for later sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedModel {
    pub id: SavedModelId,
    pub user_id: UserId,
    pub name: String,
    pub image_url: ImageRef,
    pub created_at: DateTime<Utc>,
}

/// A saved look: every layer of an outfit history plus a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedOutfit {
    pub id: SavedOutfitId,
    pub user_id: UserId,
    pub name: String,
    pub thumbnail_url: ImageRef,
    pub layers: Vec<OutfitLayer>,
    pub created_at: DateTime<Utc>,
}

impl SavedOutfit {
    /// Rebuild the history this look was saved from, pointing at its last
    /// layer.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Invalid`] if the stored layers are corrupt.
    pub fn to_history(&self) -> Result<OutfitHistory, HistoryError> {
        OutfitHistory::from_layers(self.layers.clone())
    }
}

/// Everything the user has saved, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Library {
    pub models: Vec<SavedModel>,
    pub outfits: Vec<SavedOutfit>,
}

impl Library {
    #[must_use]
    pub fn model(&self, id: SavedModelId) -> Option<&SavedModel> {
        self.models.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn outfit(&self, id: SavedOutfitId) -> Option<&SavedOutfit> {
        self.outfits.iter().find(|o| o.id == id)
    }

    /// Models with `id` removed.
    #[must_use]
    pub fn models_without(&self, id: SavedModelId) -> Vec<SavedModel> {
        self.models.iter().filter(|m| m.id != id).cloned().collect()
    }

    /// Outfits with `id` removed.
    #[must_use]
    pub fn outfits_without(&self, id: SavedOutfitId) -> Vec<SavedOutfit> {
        self.outfits.iter().filter(|o| o.id != id).cloned().collect()
    }
}
