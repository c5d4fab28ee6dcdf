//! Saved models and saved looks.
//!
//! Every query is scoped by `user_id`; a row owned by someone else behaves
//! as if it does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use fitting_room_core::{
    ImageRef, OutfitLayer, SavedModel, SavedModelId, SavedOutfit, SavedOutfitId, UserId,
};

use super::RepositoryError;
use crate::services::{LibraryStore, StoreError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SavedModelRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    image_url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SavedModelRow> for SavedModel {
    type Error = RepositoryError;

    fn try_from(row: SavedModelRow) -> Result<Self, Self::Error> {
        let image_url = ImageRef::parse(&row.image_url).map_err(|e| {
            RepositoryError::DataCorruption(format!("saved model {} image: {e}", row.id))
        })?;

        Ok(Self {
            id: SavedModelId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            image_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SavedOutfitRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    thumbnail_url: String,
    layers: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<SavedOutfitRow> for SavedOutfit {
    type Error = RepositoryError;

    fn try_from(row: SavedOutfitRow) -> Result<Self, Self::Error> {
        let thumbnail_url = ImageRef::parse(&row.thumbnail_url).map_err(|e| {
            RepositoryError::DataCorruption(format!("saved outfit {} thumbnail: {e}", row.id))
        })?;
        let layers: Vec<OutfitLayer> = serde_json::from_value(row.layers).map_err(|e| {
            RepositoryError::DataCorruption(format!("saved outfit {} layers: {e}", row.id))
        })?;

        Ok(Self {
            id: SavedOutfitId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            thumbnail_url,
            layers,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for library database operations.
pub struct LibraryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LibraryRepository<'a> {
    /// Create a new library repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved models, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unreadable row.
    #[instrument(skip(self))]
    pub async fn list_models(&self, user_id: UserId) -> Result<Vec<SavedModel>, RepositoryError> {
        let rows = sqlx::query_as::<_, SavedModelRow>(
            r"
            SELECT id, user_id, name, image_url, created_at
            FROM saved_models
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a saved model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, image))]
    pub async fn insert_model(
        &self,
        user_id: UserId,
        name: &str,
        image: &ImageRef,
    ) -> Result<SavedModel, RepositoryError> {
        let row = sqlx::query_as::<_, SavedModelRow>(
            r"
            INSERT INTO saved_models (id, user_id, name, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, image_url, created_at
            ",
        )
        .bind(SavedModelId::generate())
        .bind(user_id)
        .bind(name)
        .bind(image.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Delete a saved model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such model.
    #[instrument(skip(self))]
    pub async fn delete_model(
        &self,
        user_id: UserId,
        id: SavedModelId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM saved_models WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Saved looks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unreadable row.
    #[instrument(skip(self))]
    pub async fn list_outfits(&self, user_id: UserId) -> Result<Vec<SavedOutfit>, RepositoryError> {
        let rows = sqlx::query_as::<_, SavedOutfitRow>(
            r"
            SELECT id, user_id, name, thumbnail_url, layers, created_at
            FROM saved_outfits
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a saved look.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the layers cannot be
    /// serialized, or `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, thumbnail, layers), fields(layers = layers.len()))]
    pub async fn insert_outfit(
        &self,
        user_id: UserId,
        name: &str,
        thumbnail: &ImageRef,
        layers: &[OutfitLayer],
    ) -> Result<SavedOutfit, RepositoryError> {
        let layers = serde_json::to_value(layers)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let row = sqlx::query_as::<_, SavedOutfitRow>(
            r"
            INSERT INTO saved_outfits (id, user_id, name, thumbnail_url, layers)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, thumbnail_url, layers, created_at
            ",
        )
        .bind(SavedOutfitId::generate())
        .bind(user_id)
        .bind(name)
        .bind(thumbnail.as_str())
        .bind(layers)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Delete a saved look.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such look.
    #[instrument(skip(self))]
    pub async fn delete_outfit(
        &self,
        user_id: UserId,
        id: SavedOutfitId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM saved_outfits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// [`LibraryStore`] backed by `saved_models` and `saved_outfits`.
#[derive(Clone)]
pub struct PgLibraryStore {
    pool: PgPool,
}

impl PgLibraryStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    const fn repo(&self) -> LibraryRepository<'_> {
        LibraryRepository::new(&self.pool)
    }
}

#[async_trait]
impl LibraryStore for PgLibraryStore {
    async fn list_models(&self, user: UserId) -> Result<Vec<SavedModel>, StoreError> {
        Ok(self.repo().list_models(user).await?)
    }

    async fn insert_model(
        &self,
        user: UserId,
        name: &str,
        image: &ImageRef,
    ) -> Result<SavedModel, StoreError> {
        Ok(self.repo().insert_model(user, name, image).await?)
    }

    async fn delete_model(&self, user: UserId, id: SavedModelId) -> Result<(), StoreError> {
        Ok(self.repo().delete_model(user, id).await?)
    }

    async fn list_outfits(&self, user: UserId) -> Result<Vec<SavedOutfit>, StoreError> {
        Ok(self.repo().list_outfits(user).await?)
    }

    async fn insert_outfit(
        &self,
        user: UserId,
        name: &str,
        thumbnail: &ImageRef,
        layers: &[OutfitLayer],
    ) -> Result<SavedOutfit, StoreError> {
        Ok(self
            .repo()
            .insert_outfit(user, name, thumbnail, layers)
            .await?)
    }

    async fn delete_outfit(&self, user: UserId, id: SavedOutfitId) -> Result<(), StoreError> {
        Ok(self.repo().delete_outfit(user, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outfit_row_with_corrupt_layers() {
        let row = SavedOutfitRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Casual".to_string(),
            thumbnail_url: "https://cdn.example.com/t.png".to_string(),
            layers: serde_json::json!({"not": "a list"}),
            created_at: Utc::now(),
        };
        assert!(matches!(
            SavedOutfit::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_model_row_conversion() {
        let row = SavedModelRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Me".to_string(),
            image_url: "https://cdn.example.com/me.png".to_string(),
            created_at: Utc::now(),
        };
        let model = SavedModel::try_from(row).expect("convert");
        assert!(model.image_url.is_remote());
    }
}
