//! Validated image references.
//!
//! Images travel through the studio as strings: either a public `http(s)` URL
//! (stored uploads, wardrobe assets) or an inline `data:` URL carrying base64
//! bytes (user uploads, generator output). Anything else is rejected at the
//! edge, before any credit check or remote call.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing an [`ImageRef`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    /// The input string is empty.
    #[error("image reference cannot be empty")]
    Empty,
    /// A `data:` URL without the `;base64,` marker or with a non-image type.
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(&'static str),
    /// An http(s) URL that does not parse.
    #[error("invalid image URL: {0}")]
    InvalidUrl(String),
    /// Neither a data URL nor an http(s) URL.
    #[error("unsupported image scheme")]
    UnsupportedScheme,
}

/// An image source accepted by the generator.
///
/// # Examples
///
/// ```
/// use fitting_room_core::ImageRef;
///
/// let inline = ImageRef::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
/// assert_eq!(inline.mime_type(), Some("image/png"));
///
/// let remote = ImageRef::parse("https://cdn.example.com/tee.png").unwrap();
/// assert!(remote.is_remote());
///
/// assert!(ImageRef::parse("ftp://example.com/a.png").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef(String);

impl ImageRef {
    /// Parse and validate an image reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, a malformed data URL, or not an
    /// http(s) URL.
    pub fn parse(s: &str) -> Result<Self, ImageRefError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }

        if let Some(rest) = s.strip_prefix("data:") {
            let (mime, payload) = rest
                .split_once(";base64,")
                .ok_or(ImageRefError::MalformedDataUrl("missing base64 marker"))?;
            if !mime.starts_with("image/") || mime.len() == "image/".len() {
                return Err(ImageRefError::MalformedDataUrl("not an image mime type"));
            }
            if payload.is_empty() {
                return Err(ImageRefError::MalformedDataUrl("empty payload"));
            }
            return Ok(Self(s.to_owned()));
        }

        let url = url::Url::parse(s).map_err(|e| ImageRefError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(s.to_owned())),
            _ => Err(ImageRefError::UnsupportedScheme),
        }
    }

    /// Build an inline data URL from a mime type and base64 payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the mime type is not an image type or the payload is empty.
    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self, ImageRefError> {
        Self::parse(&format!("data:{mime_type};base64,{data}"))
    }

    /// Returns the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the image must be fetched over the network.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !self.0.starts_with("data:")
    }

    /// Mime type of an inline image.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.data_parts().map(|(mime, _)| mime)
    }

    /// Base64 payload of an inline image.
    #[must_use]
    pub fn base64_data(&self) -> Option<&str> {
        self.data_parts().map(|(_, data)| data)
    }

    fn data_parts(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix("data:")?.split_once(";base64,")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Inline payloads can run to megabytes; keep logs readable.
        match self.mime_type() {
            Some(mime) => write!(f, "data:{mime};base64,…({} bytes)", self.0.len()),
            None => f.write_str(&self.0),
        }
    }
}

impl TryFrom<String> for ImageRef {
    type Error = ImageRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.0
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_url() {
        let image = ImageRef::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert!(!image.is_remote());
        assert_eq!(image.mime_type(), Some("image/jpeg"));
        assert_eq!(image.base64_data(), Some("/9j/4AAQ"));
    }

    #[test]
    fn test_parse_https_url() {
        let image = ImageRef::parse("https://example.com/a.png").unwrap();
        assert!(image.is_remote());
        assert_eq!(image.mime_type(), None);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert_eq!(ImageRef::parse("  "), Err(ImageRefError::Empty));
        assert!(matches!(
            ImageRef::parse("data:text/plain;base64,aGk="),
            Err(ImageRefError::MalformedDataUrl(_))
        ));
        assert!(matches!(
            ImageRef::parse("data:image/png,raw"),
            Err(ImageRefError::MalformedDataUrl(_))
        ));
        assert!(matches!(
            ImageRef::parse("data:image/png;base64,"),
            Err(ImageRefError::MalformedDataUrl(_))
        ));
        assert_eq!(
            ImageRef::parse("file:///etc/passwd"),
            Err(ImageRefError::UnsupportedScheme)
        );
        assert!(matches!(
            ImageRef::parse("not a url"),
            Err(ImageRefError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<ImageRef, _> = serde_json::from_str("\"https://example.com/x.png\"");
        assert!(ok.is_ok());
        let bad: Result<ImageRef, _> = serde_json::from_str("\"javascript:alert(1)\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_display_elides_payload() {
        let image = ImageRef::from_base64("image/png", "AAAA").unwrap();
        let shown = image.to_string();
        assert!(shown.starts_with("data:image/png;base64,…"));
        assert!(!shown.contains("AAAA"));
    }
}
