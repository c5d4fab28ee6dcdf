//! Persistence seams for credits and the saved-looks library.
//!
//! Postgres implementations live in [`crate::db`]; tests use in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use fitting_room_core::{
    CreditBalance, ImageRef, OutfitLayer, SavedModel, SavedModelId, SavedOutfit, SavedOutfitId,
    UserId,
};

/// Errors reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend cannot perform this operation (e.g. no atomic decrement).
    #[error("operation not supported by this store")]
    Unsupported,

    /// Row not found or not owned by the user.
    #[error("not found")]
    NotFound,

    /// The server refused to spend a credit it does not have.
    #[error("no credits left on the server")]
    Exhausted,

    /// Any other backend failure.
    #[error("store error: {0}")]
    Backend(String),
}

/// Server-side credit balance.
#[async_trait]
pub trait CreditsStore: Send + Sync {
    /// Current balance, creating the profile with the default balance if it
    /// does not exist yet.
    async fn get_credits(&self, user: UserId) -> Result<CreditBalance, StoreError>;

    /// Overwrite the balance. Returns the stored value.
    async fn set_credits(
        &self,
        user: UserId,
        credits: CreditBalance,
    ) -> Result<CreditBalance, StoreError>;

    /// Spend one credit atomically. Returns the new balance.
    ///
    /// Stores without an atomic path return [`StoreError::Unsupported`].
    async fn decrement_credits(&self, user: UserId) -> Result<CreditBalance, StoreError>;

    /// Top up after a payment. Returns the new balance.
    async fn add_credits(&self, user: UserId, credits: u32) -> Result<CreditBalance, StoreError>;
}

/// Saved models and saved looks, scoped to one user.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Saved models, newest first.
    async fn list_models(&self, user: UserId) -> Result<Vec<SavedModel>, StoreError>;

    async fn insert_model(
        &self,
        user: UserId,
        name: &str,
        image: &ImageRef,
    ) -> Result<SavedModel, StoreError>;

    async fn delete_model(&self, user: UserId, id: SavedModelId) -> Result<(), StoreError>;

    /// Saved looks, newest first.
    async fn list_outfits(&self, user: UserId) -> Result<Vec<SavedOutfit>, StoreError>;

    async fn insert_outfit(
        &self,
        user: UserId,
        name: &str,
        thumbnail: &ImageRef,
        layers: &[OutfitLayer],
    ) -> Result<SavedOutfit, StoreError>;

    async fn delete_outfit(&self, user: UserId, id: SavedOutfitId) -> Result<(), StoreError>;
}
