//! Studio route handlers.
//!
//! Each action runs on the caller's [`StudioSession`] and answers with the
//! new view plus an optional toast. A failed action answers with an error
//! notice and leaves the session as it was.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use uuid::Uuid;

use fitting_room_core::{EditInstruction, GarmentCategory, GarmentId, ImageRef, WardrobeItem};

use super::ApiJson;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::{ActionOutcome, AuthenticatedUser, StudioView};
use crate::services::{StudioError, StudioSession};
use crate::state::AppState;

/// The caller's live session.
pub(super) async fn session_for(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Arc<StudioSession>, AppError> {
    Ok(state.sessions().get_or_create(user.id).await?)
}

/// An image supplied by the client.
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image: String,
}

/// Garment to apply: a wardrobe ID or a new upload.
#[derive(Debug, Deserialize)]
pub struct ApplyGarmentRequest {
    #[serde(default)]
    pub garment_id: Option<GarmentId>,
    #[serde(default)]
    pub item: Option<GarmentUpload>,
}

/// A garment that is not in the wardrobe yet.
#[derive(Debug, Deserialize)]
pub struct GarmentUpload {
    #[serde(default)]
    pub id: Option<GarmentId>,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub category: Option<GarmentCategory>,
}

impl GarmentUpload {
    fn into_item(self) -> Result<WardrobeItem, StudioError> {
        let url = ImageRef::parse(&self.url)?;
        Ok(WardrobeItem {
            id: self
                .id
                .unwrap_or_else(|| GarmentId::new(format!("custom-{}", Uuid::new_v4()))),
            name: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Custom garment".to_string()),
            url,
            category: self.category.unwrap_or(GarmentCategory::Clothing),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub edit: EditInstruction,
}

#[derive(Debug, Deserialize)]
pub struct MixtapeRequest {
    pub theme: String,
}

/// GET /api/studio
///
/// # Errors
///
/// Returns `AppError` if the session cannot be created.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<StudioView>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.view().await))
}

/// POST /api/studio/model
///
/// # Errors
///
/// Returns `AppError` for an invalid image or a failed generation.
pub async fn finalize_model(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<ImageRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let photo = ImageRef::parse(&req.image).map_err(StudioError::from)?;
    let session = session_for(&state, &user).await?;
    Ok(Json(session.finalize_model(photo).await?))
}

/// POST /api/studio/garments
///
/// # Errors
///
/// Returns `AppError` when neither `garment_id` nor `item` is given, or when
/// the try-on fails.
pub async fn apply_garment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<ApplyGarmentRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    let outcome = match (req.garment_id, req.item) {
        (_, Some(upload)) => session.apply_garment(upload.into_item()?).await?,
        (Some(id), None) => session.apply_wardrobe_item(&id).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Choose a garment to try on.".to_string(),
            ));
        }
    };
    Ok(Json(outcome))
}

/// POST /api/studio/undo
///
/// # Errors
///
/// Returns `AppError` when only the base model is shown.
pub async fn remove_last(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.remove_last().await?))
}

/// POST /api/studio/revert
///
/// # Errors
///
/// Returns `AppError` for an index outside the history.
pub async fn revert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<IndexRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.revert_to(req.index).await?))
}

/// POST /api/studio/pose
///
/// # Errors
///
/// Returns `AppError` for an unknown pose or a failed generation.
pub async fn select_pose(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<IndexRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.select_pose(req.index).await?))
}

/// POST /api/studio/edit
///
/// # Errors
///
/// Returns `AppError` for a blank edit or a failed generation.
pub async fn edit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<EditRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.edit_image(req.edit).await?))
}

/// POST /api/studio/mixtape
///
/// A failure part way through still answers 200: the garments applied
/// before it are kept and the notice says what went wrong.
///
/// # Errors
///
/// Returns `AppError` if nothing could be applied.
pub async fn mixtape(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<MixtapeRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.mixtape(&req.theme).await?))
}

/// POST /api/studio/reset
///
/// # Errors
///
/// Returns `AppError` while a generation is running.
pub async fn start_over(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.start_over().await?))
}

/// DELETE /api/studio/wardrobe/{id}
///
/// # Errors
///
/// Returns `AppError` while a generation is running.
pub async fn remove_wardrobe_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.remove_wardrobe_item(&GarmentId::new(id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_defaults() {
        let upload: GarmentUpload =
            serde_json::from_str(r#"{"url": "https://cdn.example.com/jacket.png"}"#)
                .expect("parse");
        let item = upload.into_item().expect("item");

        assert!(item.id.as_str().starts_with("custom-"));
        assert_eq!(item.name, "Custom garment");
        assert_eq!(item.category, GarmentCategory::Clothing);
    }

    #[test]
    fn test_upload_rejects_bad_url() {
        let upload = GarmentUpload {
            id: None,
            name: Some("Scarf".to_string()),
            url: "ftp://example.com/scarf.png".to_string(),
            category: Some(GarmentCategory::Accessory),
        };
        assert!(matches!(
            upload.into_item(),
            Err(StudioError::InvalidInput(_))
        ));
    }
}
