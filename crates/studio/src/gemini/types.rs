//! Request and response types for `generateContent`.

use serde::{Deserialize, Serialize};

use fitting_room_core::{GarmentId, ImageRef};

use crate::services::GenerationError;

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single user turn.
    #[must_use]
    pub fn user(parts: Vec<Part>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(generation_config),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    /// Image output only.
    #[must_use]
    pub fn image() -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            ..Self::default()
        }
    }

    /// JSON output matching `{"outfitIds": string[]}`.
    #[must_use]
    pub fn outfit_ids() -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(serde_json::json!({
                "type": "OBJECT",
                "properties": {
                    "outfitIds": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    }
                }
            })),
            ..Self::default()
        }
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    /// The prompt-level block reason, if the request was refused outright.
    fn block_reason(&self) -> Option<String> {
        let feedback = self.prompt_feedback.as_ref()?;
        let reason = feedback.block_reason.as_deref()?;
        Some(match feedback.block_reason_message.as_deref() {
            Some(message) if !message.is_empty() => format!("{reason}. {message}"),
            _ => reason.to_string(),
        })
    }

    /// All text parts joined, trimmed. `None` if there is no text.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|part| part.text.as_deref()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// The first image in any candidate.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::Blocked`] for a prompt block, or when the first
    ///   candidate stopped for any reason other than `STOP` without an image
    /// - [`GenerationError::NoImage`] when the model only answered in text
    /// - [`GenerationError::Malformed`] for an unusable inline payload
    pub fn into_image(self) -> Result<ImageRef, GenerationError> {
        if let Some(reason) = self.block_reason() {
            return Err(GenerationError::Blocked(reason));
        }

        if let Some(data) = self.parts().find_map(|part| part.inline_data.as_ref()) {
            return ImageRef::from_base64(&data.mime_type, &data.data)
                .map_err(|e| GenerationError::Malformed(e.to_string()));
        }

        let finish_reason = self
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref());
        if let Some(reason) = finish_reason.filter(|reason| *reason != "STOP") {
            return Err(GenerationError::Blocked(reason.to_string()));
        }

        Err(GenerationError::NoImage(self.text()))
    }

    /// Garment IDs from a stylist answer.
    ///
    /// # Errors
    ///
    /// [`GenerationError::Blocked`] for a prompt block,
    /// [`GenerationError::Malformed`] if the text is not the expected JSON.
    pub fn into_outfit_ids(self) -> Result<Vec<GarmentId>, GenerationError> {
        if let Some(reason) = self.block_reason() {
            return Err(GenerationError::Blocked(reason));
        }
        let text = self
            .text()
            .ok_or_else(|| GenerationError::Malformed("empty stylist response".to_string()))?;
        parse_outfit_ids(&text)
    }
}

#[derive(Debug, Deserialize)]
struct OutfitIds {
    #[serde(rename = "outfitIds")]
    outfit_ids: Vec<String>,
}

/// Parse `{"outfitIds": [...]}`, tolerating a surrounding markdown fence.
///
/// # Errors
///
/// [`GenerationError::Malformed`] if the JSON does not have that shape.
pub fn parse_outfit_ids(text: &str) -> Result<Vec<GarmentId>, GenerationError> {
    let json = strip_code_fence(text);
    let parsed: OutfitIds = serde_json::from_str(json)
        .map_err(|e| GenerationError::Malformed(format!("stylist response: {e}")))?;
    Ok(parsed.outfit_ids.into_iter().map(GarmentId::new).collect())
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).expect("deserialize")
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest::user(
            vec![Part::inline("image/png", "AAAA"), Part::text("wear this")],
            GenerationConfig::image(),
        );
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "wear this");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_image_response() {
        let image = response(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
            ]},"finishReason":"STOP"}]}"#,
        )
        .into_image()
        .expect("image");
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_prompt_block() {
        let err = response(
            r#"{"promptFeedback":{"blockReason":"SAFETY","blockReasonMessage":"Unsafe content"}}"#,
        )
        .into_image()
        .expect_err("blocked");
        assert_eq!(err, GenerationError::Blocked("SAFETY. Unsafe content".to_string()));
    }

    #[test]
    fn test_non_stop_finish_without_image_is_blocked() {
        let err = response(r#"{"candidates":[{"finishReason":"IMAGE_SAFETY"}]}"#)
            .into_image()
            .expect_err("blocked");
        assert_eq!(err, GenerationError::Blocked("IMAGE_SAFETY".to_string()));
    }

    #[test]
    fn test_text_only_is_no_image() {
        let err = response(
            r#"{"candidates":[{"content":{"parts":[{"text":" I can't do that. "}]},"finishReason":"STOP"}]}"#,
        )
        .into_image()
        .expect_err("no image");
        assert_eq!(err, GenerationError::NoImage(Some("I can't do that.".to_string())));

        let err = response(r#"{"candidates":[]}"#).into_image().expect_err("empty");
        assert_eq!(err, GenerationError::NoImage(None));
    }

    #[test]
    fn test_parse_outfit_ids() {
        let ids = parse_outfit_ids(r#"{"outfitIds":["gemini-tee","beanie-hat"]}"#).expect("ids");
        assert_eq!(ids, vec![GarmentId::new("gemini-tee"), GarmentId::new("beanie-hat")]);

        let ids = parse_outfit_ids("```json\n{\"outfitIds\": []}\n```").expect("fenced");
        assert!(ids.is_empty());

        let err = parse_outfit_ids("Sure! Here's an outfit").expect_err("prose");
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_outfit_ids_response() {
        let ids = response(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"outfitIds\":[\"gold-necklace\"]}"}]}}]}"#,
        )
        .into_outfit_ids()
        .expect("ids");
        assert_eq!(ids, vec![GarmentId::new("gold-necklace")]);
    }
}
