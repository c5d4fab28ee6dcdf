//! Business logic services for the studio.
//!
//! # Services
//!
//! - `studio` - Per-user session: outfit history, generation pipeline, library
//! - `sessions` - Registry of live sessions with idle expiry
//! - `credits` - Local credit balance reconciled with the credits store
//! - `generation` - Seams to the image model and the outfit stylist
//! - `store` - Seams to credit and library persistence
//! - `auth` - Bearer-token authentication seam

pub mod auth;
pub mod credits;
pub mod error;
pub mod generation;
pub mod sessions;
pub mod store;
pub mod studio;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{AuthError, Authenticator, bearer_token};
pub use credits::CreditLedger;
pub use error::StudioError;
pub use generation::{GenerationError, ImageGenerator, OutfitSuggester, SuggestionItem};
pub use sessions::SessionRegistry;
pub use store::{CreditsStore, LibraryStore, StoreError};
pub use studio::{CREDIT_SAVE_FAILED, Services, StudioSession};
