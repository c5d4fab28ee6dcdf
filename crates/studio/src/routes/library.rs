//! Saved models and saved looks.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use fitting_room_core::{ImageRef, SavedModelId, SavedOutfitId};

use super::ApiJson;
use super::studio::session_for;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::ActionOutcome;
use crate::services::StudioError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveModelRequest {
    pub name: String,
    /// Defaults to the session's current model.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveLookRequest {
    pub name: String,
}

/// GET /api/library
///
/// # Errors
///
/// Returns `AppError` if the library cannot be read.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.load_library().await?))
}

/// POST /api/library/models
///
/// # Errors
///
/// Returns `AppError` for a blank name, no image to save, or a store failure.
pub async fn save_model(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<SaveModelRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    let image = match req.image {
        Some(image) => ImageRef::parse(&image).map_err(StudioError::from)?,
        None => session
            .view()
            .await
            .model_image
            .ok_or(StudioError::NoModel)?,
    };
    Ok(Json(session.save_model(&req.name, image).await?))
}

/// POST /api/library/models/{id}/select
///
/// # Errors
///
/// Returns `AppError` for an unknown model.
pub async fn select_model(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<SavedModelId>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.select_model(id).await?))
}

/// DELETE /api/library/models/{id}
///
/// # Errors
///
/// Returns `AppError` if the store refuses the delete; the model stays in
/// the list.
pub async fn delete_model(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<SavedModelId>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.delete_model(id).await?))
}

/// POST /api/library/outfits
///
/// # Errors
///
/// Returns `AppError` for a blank name, no garments, no credits, or a store
/// failure.
pub async fn save_look(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<SaveLookRequest>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.save_look(&req.name).await?))
}

/// POST /api/library/outfits/{id}/load
///
/// # Errors
///
/// Returns `AppError` for an unknown look.
pub async fn load_look(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<SavedOutfitId>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.load_look(id).await?))
}

/// DELETE /api/library/outfits/{id}
///
/// # Errors
///
/// Returns `AppError` if the store refuses the delete.
pub async fn delete_look(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<SavedOutfitId>,
) -> Result<Json<ActionOutcome>, AppError> {
    let session = session_for(&state, &user).await?;
    Ok(Json(session.delete_outfit(id).await?))
}
