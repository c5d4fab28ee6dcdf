//! Gemini API client.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use fitting_room_core::catalog::mixtape_prompt;
use fitting_room_core::{GarmentId, ImageRef};

use crate::config::GeminiConfig;
use crate::services::{GenerationError, ImageGenerator, OutfitSuggester, SuggestionItem};

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Gemini API client.
///
/// Implements both [`ImageGenerator`] (image model) and [`OutfitSuggester`]
/// (text model).
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    /// Carries the API key; only ever talks to Gemini.
    client: reqwest::Client,
    /// No default headers; downloads garment images from arbitrary hosts.
    fetcher: reqwest::Client,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::InvalidApiKey` if the key is not a valid header
    /// value, or `GeminiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| GeminiError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        let fetcher = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                fetcher,
                image_model: config.image_model.clone(),
                text_model: config.text_model.clone(),
            }),
        })
    }

    /// Call `generateContent` on `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error
    /// status.
    #[instrument(skip(self, request), fields(model = %model))]
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{GEMINI_API_BASE}/models/{model}:generateContent");
        let response = self.inner.client.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return GeminiError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return GeminiError::Unauthorized("Invalid API key".to_string());
        }

        match response.text().await {
            Ok(body) => {
                let message = serde_json::from_str::<ApiErrorResponse>(&body)
                    .map_or(body, |api_error| api_error.error.message);
                GeminiError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(e) => GeminiError::Http(e),
        }
    }

    /// Turn an image reference into an inline part, downloading remote
    /// images first.
    async fn inline_part(&self, image: &ImageRef) -> Result<Part, GeminiError> {
        if let (Some(mime), Some(data)) = (image.mime_type(), image.base64_data()) {
            return Ok(Part::inline(mime, data));
        }

        let url = image.as_str();
        debug!(url, "Fetching remote image");
        let response = self.inner.fetcher.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeminiError::ImageFetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        let bytes = response.bytes().await?;
        Ok(Part::inline(mime, STANDARD.encode(&bytes)))
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    #[instrument(skip(self, images, prompt), fields(model = %self.inner.image_model, images = images.len()))]
    async fn generate(
        &self,
        images: &[ImageRef],
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        let mut parts = Vec::with_capacity(images.len() + 1);
        for image in images {
            parts.push(self.inline_part(image).await?);
        }
        parts.push(Part::text(prompt));

        let request = GenerateContentRequest::user(parts, GenerationConfig::image());
        let response = self
            .generate_content(&self.inner.image_model, &request)
            .await?;

        response.into_image().inspect_err(|e| {
            warn!(error = %e, "Gemini returned no usable image");
        })
    }
}

#[async_trait]
impl OutfitSuggester for GeminiClient {
    #[instrument(skip(self, items), fields(model = %self.inner.text_model, items = items.len()))]
    async fn suggest(
        &self,
        items: &[SuggestionItem],
        theme: &str,
    ) -> Result<Vec<GarmentId>, GenerationError> {
        let items_json = serde_json::to_string_pretty(items)
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let request = GenerateContentRequest::user(
            vec![Part::text(mixtape_prompt(theme, &items_json))],
            GenerationConfig::outfit_ids(),
        );

        let response = self.generate_content(&self.inner.text_model, &request).await?;
        let ids = response.into_outfit_ids()?;
        debug!(suggested = ids.len(), "Stylist answered");
        Ok(ids)
    }
}
