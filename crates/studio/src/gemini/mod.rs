//! Google Gemini integration for image generation and outfit suggestions.
//!
//! # Endpoints
//!
//! Both seams call `models/{model}:generateContent` over REST:
//!
//! - [`ImageGenerator`](crate::services::ImageGenerator) sends the input
//!   images as inline parts followed by the prompt, with the response
//!   modality restricted to images.
//! - [`OutfitSuggester`](crate::services::OutfitSuggester) asks the text
//!   model for `{"outfitIds": [...]}` in JSON response mode.
//!
//! Remote (`https://`) image references are downloaded and inlined before
//! the request is sent; Gemini only sees base64 data.

pub mod client;
pub mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::GeminiError;
