//! Encoded still-image payloads.
//!
//! Face login and face registration send a captured frame to the backend as
//! a `data:` URL (`data:image/jpeg;base64,...`). [`ImageDataUrl`] guarantees
//! the string has that shape before it leaves the process.

use core::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// MIME types accepted for captured stills.
const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Errors that can occur when parsing an [`ImageDataUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageDataUrlError {
    /// The string does not start with `data:`.
    #[error("image must be a data URL")]
    NotDataUrl,
    /// The data URL is not base64 encoded.
    #[error("image data URL must be base64 encoded")]
    NotBase64,
    /// The MIME type is not an accepted image type.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    /// The payload is empty.
    #[error("image payload is empty")]
    Empty,
    /// The payload is not valid base64.
    #[error("image payload is not valid base64")]
    InvalidPayload,
}

/// A base64 `data:` URL carrying a single still image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageDataUrl(String);

impl ImageDataUrl {
    /// Encode raw image bytes as a data URL.
    #[must_use]
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
    }

    /// Encode an uploaded image, checking its type and size first.
    ///
    /// # Errors
    ///
    /// Returns [`ImageDataUrlError::UnsupportedType`] or
    /// [`ImageDataUrlError::Empty`].
    pub fn from_upload(mime_type: &str, bytes: &[u8]) -> Result<Self, ImageDataUrlError> {
        if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
            return Err(ImageDataUrlError::UnsupportedType(mime_type.to_string()));
        }
        if bytes.is_empty() {
            return Err(ImageDataUrlError::Empty);
        }
        Ok(Self::encode(mime_type, bytes))
    }

    /// Validate a data URL received from a browser or a file.
    ///
    /// # Errors
    ///
    /// Returns an [`ImageDataUrlError`] when the string is not a base64 data
    /// URL of an accepted image type.
    pub fn parse(s: &str) -> Result<Self, ImageDataUrlError> {
        let s = s.trim();
        let rest = s.strip_prefix("data:").ok_or(ImageDataUrlError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageDataUrlError::NotBase64)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageDataUrlError::NotBase64)?;

        if !ACCEPTED_MIME_TYPES.contains(&mime_type) {
            return Err(ImageDataUrlError::UnsupportedType(mime_type.to_string()));
        }
        if payload.is_empty() {
            return Err(ImageDataUrlError::Empty);
        }
        STANDARD
            .decode(payload)
            .map_err(|_| ImageDataUrlError::InvalidPayload)?;

        Ok(Self(s.to_owned()))
    }

    /// The MIME type declared in the URL header.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map_or("", |(mime, _)| mime)
    }

    /// Decode the payload bytes.
    #[must_use]
    pub fn decode(&self) -> Vec<u8> {
        self.0
            .split_once(',')
            .and_then(|(_, payload)| STANDARD.decode(payload).ok())
            .unwrap_or_default()
    }

    /// The full data URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Payloads are large; keep logs readable.
impl fmt::Debug for ImageDataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageDataUrl")
            .field("mime_type", &self.mime_type())
            .field("len", &self.0.len())
            .finish()
    }
}

impl TryFrom<String> for ImageDataUrl {
    type Error = ImageDataUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageDataUrl> for String {
    fn from(url: ImageDataUrl) -> Self {
        url.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];

    #[test]
    fn test_encode_produces_jpeg_data_url() {
        let url = ImageDataUrl::encode("image/jpeg", JPEG_MAGIC);
        assert!(url.as_str().starts_with("data:image/jpeg;base64,"));
        assert_eq!(url.mime_type(), "image/jpeg");
        assert_eq!(url.decode(), JPEG_MAGIC);
    }

    #[test]
    fn test_parse_accepts_encoded_output() {
        let url = ImageDataUrl::encode("image/jpeg", JPEG_MAGIC);
        assert_eq!(ImageDataUrl::parse(url.as_str()).unwrap(), url);
    }

    #[test]
    fn test_parse_rejects_malformed_urls() {
        assert_eq!(
            ImageDataUrl::parse("https://example.com/a.jpg"),
            Err(ImageDataUrlError::NotDataUrl)
        );
        assert_eq!(
            ImageDataUrl::parse("data:image/jpeg,abc"),
            Err(ImageDataUrlError::NotBase64)
        );
        assert_eq!(
            ImageDataUrl::parse("data:text/plain;base64,aGk="),
            Err(ImageDataUrlError::UnsupportedType("text/plain".to_string()))
        );
        assert_eq!(
            ImageDataUrl::parse("data:image/jpeg;base64,"),
            Err(ImageDataUrlError::Empty)
        );
        assert_eq!(
            ImageDataUrl::parse("data:image/jpeg;base64,!!!"),
            Err(ImageDataUrlError::InvalidPayload)
        );
    }

    #[test]
    fn test_from_upload_checks_type_and_size() {
        assert!(ImageDataUrl::from_upload("image/png", &[0x89, b'P', b'N', b'G']).is_ok());
        assert_eq!(
            ImageDataUrl::from_upload("image/gif", b"GIF89a"),
            Err(ImageDataUrlError::UnsupportedType("image/gif".to_string()))
        );
        assert_eq!(
            ImageDataUrl::from_upload("image/jpeg", &[]),
            Err(ImageDataUrlError::Empty)
        );
    }

    #[test]
    fn test_debug_omits_payload() {
        let url = ImageDataUrl::encode("image/jpeg", &[0u8; 64]);
        let debug = format!("{url:?}");
        assert!(debug.contains("image/jpeg"));
        assert!(!debug.contains("AAAA"));
    }
}
