//! Credit balance, packages and checkout.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use fitting_room_core::{CREDIT_PACKAGES, CreditBalance, CreditPackage, Price};

use super::ApiJson;
use super::studio::session_for;
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::payments::PaymentError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub credits: CreditBalance,
}

/// A package as shown in the purchase dialog.
#[derive(Debug, Serialize)]
pub struct PackageView {
    pub credits: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub price: Price,
    pub popular: bool,
    /// Whether checkout can sell it on this deployment.
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub credits: u32,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// GET /api/credits
///
/// # Errors
///
/// Returns `AppError` if the credits store cannot be read.
pub async fn balance(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let session = session_for(&state, &user).await?;
    let credits = session.refresh_credits().await?;
    Ok(Json(BalanceResponse { credits }))
}

/// GET /api/credits/packages
pub async fn packages(State(state): State<AppState>) -> Json<Vec<PackageView>> {
    let sellable = state.payments().is_some();
    Json(
        CREDIT_PACKAGES
            .iter()
            .map(|package: &CreditPackage| PackageView {
                credits: package.credits,
                name: package.name,
                description: package.description,
                price: package.price(),
                popular: package.popular,
                available: sellable,
            })
            .collect(),
    )
}

/// POST /api/checkout
///
/// # Errors
///
/// Returns `AppError` when payments are not configured, the package is
/// unknown, the user has no email, or Dodo refuses the session.
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let payments = state.payments().ok_or(PaymentError::NotConfigured)?;
    let session = payments.checkout.create_checkout(&user, req.credits).await?;
    Ok(Json(CheckoutResponse {
        checkout_url: session.checkout_url,
    }))
}
