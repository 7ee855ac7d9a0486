//! Multipart face-image uploads.
//!
//! The face login and face registration pages post a `multipart/form-data`
//! body with an `image` file field (filled by the browser camera through
//! `capture="user"`) and, for login, an `email` field.

use axum::extract::Multipart;
use ecomai_core::{Email, ImageDataUrl};

/// Largest still accepted from a browser upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit: a base64 still plus form overhead.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Fields of a face upload form.
#[derive(Debug, Default)]
pub struct FaceUpload {
    pub email: Option<String>,
    pub image: Option<ImageDataUrl>,
}

impl FaceUpload {
    /// The email field, validated.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message when the field is missing or invalid.
    pub fn email(&self) -> Result<Email, String> {
        let raw = self.email.as_deref().unwrap_or_default();
        if raw.trim().is_empty() {
            return Err("Please enter your email".to_string());
        }
        Email::parse(raw).map_err(|e| format!("Invalid email: {e}"))
    }

    /// The captured image.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message when no photo was taken.
    pub fn image(&self) -> Result<&ImageDataUrl, String> {
        self.image
            .as_ref()
            .ok_or_else(|| "Please take a photo first".to_string())
    }
}

/// Read a face upload form.
///
/// # Errors
///
/// Returns a user-facing message when the body is malformed, the image is
/// too large, or the image type is not supported.
pub async fn read_face_upload(mut multipart: Multipart) -> Result<FaceUpload, String> {
    let mut upload = FaceUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Could not read the form: {e}"))?
    {
        match field.name() {
            Some("email") => {
                upload.email = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("Could not read the form: {e}"))?,
                );
            }
            Some("image") => {
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Could not read the photo: {e}"))?;

                // An untouched file input posts an empty part
                if bytes.is_empty() {
                    continue;
                }
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err("The photo is too large".to_string());
                }
                upload.image = Some(
                    ImageDataUrl::from_upload(&mime_type, &bytes)
                        .map_err(|e| format!("Invalid photo: {e}"))?,
                );
            }
            _ => {}
        }
    }

    Ok(upload)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_have_messages() {
        let upload = FaceUpload::default();
        assert_eq!(upload.email().unwrap_err(), "Please enter your email");
        assert_eq!(upload.image().unwrap_err(), "Please take a photo first");
    }

    #[test]
    fn test_email_is_validated() {
        let upload = FaceUpload {
            email: Some("not-an-email".to_string()),
            image: None,
        };
        assert!(upload.email().unwrap_err().starts_with("Invalid email"));
    }
}
