//! HTTP route handlers for the studio API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Database readiness
//!
//! # Studio (requires bearer token)
//! GET    /api/studio                    - Current view
//! POST   /api/studio/model              - Finalize the base model
//! POST   /api/studio/garments           - Apply a garment
//! POST   /api/studio/undo               - Remove the last garment
//! POST   /api/studio/revert             - Revert to a layer
//! POST   /api/studio/pose               - Select a pose
//! POST   /api/studio/edit               - Edit the displayed image
//! POST   /api/studio/mixtape            - Build an outfit from a theme
//! POST   /api/studio/reset              - Start over
//! DELETE /api/studio/wardrobe/{id}      - Remove a wardrobe item
//!
//! # Library (requires bearer token)
//! GET    /api/library                   - Saved models and looks
//! POST   /api/library/models            - Save a model
//! POST   /api/library/models/{id}/select
//! DELETE /api/library/models/{id}
//! POST   /api/library/outfits           - Save the current look
//! POST   /api/library/outfits/{id}/load
//! DELETE /api/library/outfits/{id}
//!
//! # Credits
//! GET    /api/credits                   - Refreshed balance
//! GET    /api/credits/packages          - Package list (public)
//! POST   /api/checkout                  - Hosted checkout URL
//! POST   /webhooks/payments             - Payment webhook (signed)
//! ```

pub mod credits;
pub mod library;
pub mod payments;
pub mod studio;

use std::time::Duration;

use axum::{
    Router,
    extract::{FromRequest, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::security_headers_middleware;
use crate::state::AppState;

/// JSON body extractor whose rejection is an [`AppError`] notice.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Create the studio routes router.
pub fn studio_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(studio::show))
        .route("/model", post(studio::finalize_model))
        .route("/garments", post(studio::apply_garment))
        .route("/undo", post(studio::remove_last))
        .route("/revert", post(studio::revert))
        .route("/pose", post(studio::select_pose))
        .route("/edit", post(studio::edit))
        .route("/mixtape", post(studio::mixtape))
        .route("/reset", post(studio::start_over))
        .route("/wardrobe/{id}", delete(studio::remove_wardrobe_item))
}

/// Create the library routes router.
pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(library::index))
        .route("/models", post(library::save_model))
        .route("/models/{id}", delete(library::delete_model))
        .route("/models/{id}/select", post(library::select_model))
        .route("/outfits", post(library::save_look))
        .route("/outfits/{id}", delete(library::delete_look))
        .route("/outfits/{id}/load", post(library::load_look))
}

/// Create the credit routes router.
pub fn credit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(credits::balance))
        .route("/packages", get(credits::packages))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/studio", studio_routes())
        .nest("/api/library", library_routes())
        .nest("/api/credits", credit_routes())
        .route("/api/checkout", post(credits::checkout))
        .route("/webhooks/payments", post(payments::webhook))
}

/// The full application: health checks, API routes, security headers and
/// request tracing. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
