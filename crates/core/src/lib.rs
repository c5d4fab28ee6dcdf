//! Fitting Room Core - Domain library for the virtual try-on studio.
//!
//! This crate holds the state machine behind the studio:
//! - [`outfit`] - Outfit layers, the pose image cache, the undo/redo history
//!   controller and the display resolver
//! - [`wardrobe`] - Garments the user can try on
//! - [`credits`] - Credit balance and the optimistic `Tentative` wrapper
//! - [`catalog`] - Pose instructions, edit presets and generation prompts
//! - [`image`] - Validated image references (http or data URLs)
//! - [`library`] - Saved models and saved looks
//! - [`types`] - Newtype IDs and credit package pricing
//!
//! # Architecture
//!
//! The core crate contains only types and pure transitions - no I/O, no
//! database access, no HTTP clients. The studio crate drives it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod credits;
pub mod image;
pub mod library;
pub mod outfit;
pub mod types;
pub mod wardrobe;

pub use catalog::{EditInstruction, POSE_INSTRUCTIONS, PoseIndex};
pub use credits::{CreditBalance, Tentative};
pub use image::{ImageRef, ImageRefError};
pub use library::{Library, SavedModel, SavedOutfit};
pub use outfit::{
    Applied, HistoryError, OutfitHistory, OutfitLayer, available_pose_keys, resolve_display_image,
};
pub use types::*;
pub use wardrobe::{GarmentCategory, GarmentId, Wardrobe, WardrobeItem};
