//! Face login and face registration.
//!
//! # Usage
//!
//! ```bash
//! # Keep a frame file fresh from the webcam in another terminal
//! ffmpeg -f v4l2 -i /dev/video0 -update 1 -y /dev/shm/cam.jpg
//!
//! # Log in with your face
//! ecomai face login --email ana@example.com --camera /dev/shm/cam.jpg
//!
//! # Register the face of the logged-in account
//! ecomai face register --camera /dev/shm/cam.jpg
//! ```
//!
//! The capture starts on its own once the camera is ready. Camera errors are
//! reported with their remedy and retried up to `--retries` times; Ctrl-C
//! cancels at any point.

use std::path::PathBuf;
use std::time::Duration;

use ecomai_capture::{
    CaptureConfig, CaptureController, CaptureHandle, CaptureOutcome, DeviceError, FileCamera,
    Phase,
};
use ecomai_core::ImageDataUrl;
use ecomai_storefront::backend::BackendError;
use ecomai_storefront::services::ShopError;
use tokio::sync::watch;

use super::Context;
use super::auth::parse_email;
use crate::error::CliError;

/// Capture flags shared by `face login` and `face register`.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Frame source for [`FileCamera`].
    pub camera: PathBuf,
    /// First countdown value.
    pub countdown: u8,
    /// Acquisition attempts after the first failure.
    pub retries: u8,
    /// Give up on a silent camera after this long.
    pub acquire_timeout: Duration,
}

impl CaptureOptions {
    fn config(&self) -> CaptureConfig {
        CaptureConfig {
            countdown_from: self.countdown,
            acquire_timeout: Some(self.acquire_timeout),
            // No preview is drawn in a terminal
            mirror_preview: false,
            ..CaptureConfig::default()
        }
    }
}

/// Log in with a captured face.
///
/// # Errors
///
/// Returns error if the capture fails or the face is not recognized.
pub async fn login(ctx: &Context, email: &str, options: &CaptureOptions) -> Result<(), CliError> {
    let email = parse_email(email)?;
    let image = capture(options).await?;

    ctx.shop.biometric_login(&email, &image).await?;
    tracing::info!(email = %email, "Logged in with face");
    Ok(())
}

/// Register the logged-in account's face.
///
/// # Errors
///
/// Returns error when logged out, if the capture fails, or the backend
/// refuses the photo.
pub async fn register(ctx: &Context, options: &CaptureOptions) -> Result<(), CliError> {
    // Don't open the camera for a request that cannot succeed
    if !ctx.shop.is_authenticated().await? {
        return Err(ShopError::Backend(BackendError::MissingToken).into());
    }
    let image = capture(options).await?;

    ctx.shop.register_face(&image).await?;
    tracing::info!("Face registered");
    Ok(())
}

/// Run one capture round on the file camera.
///
/// # Errors
///
/// Returns the last camera error once retries are used up, or
/// [`CliError::CaptureCancelled`] on Ctrl-C.
pub async fn capture(options: &CaptureOptions) -> Result<ImageDataUrl, CliError> {
    let camera = FileCamera::new(&options.camera);
    let (controller, handle) = CaptureController::new(camera, options.config());
    let task = tokio::spawn(controller.run());

    let gave_up = drive(&handle, handle.subscribe(), options.retries).await;

    match task.await? {
        CaptureOutcome::Captured(image) => Ok(image),
        CaptureOutcome::Cancelled => Err(gave_up.map_or(CliError::CaptureCancelled, CliError::Camera)),
    }
}

/// Follow the phases until the round ends.
///
/// Starts the countdown whenever the camera is ready and retries failed
/// acquisitions. Returns the camera error it gave up on, if any.
async fn drive(
    handle: &CaptureHandle,
    mut phases: watch::Receiver<Phase>,
    retries: u8,
) -> Option<DeviceError> {
    let mut retries_left = retries;
    let mut gave_up = None;

    loop {
        let phase = phases.borrow_and_update().clone();
        match phase {
            Phase::Initializing => tracing::info!("Waiting for the camera..."),
            Phase::Ready => {
                tracing::info!("Camera ready, look at the camera");
                handle.begin_capture();
            }
            Phase::CountingDown(0) => tracing::info!("Hold still"),
            Phase::CountingDown(n) => tracing::info!("{n}..."),
            Phase::Error(err) => {
                tracing::warn!(code = err.code(), "{err}");
                tracing::info!("{}", err.remedy());
                if retries_left > 0 {
                    retries_left -= 1;
                    tracing::info!(retries_left, "Retrying");
                    handle.retry();
                } else {
                    gave_up = Some(err);
                    handle.cancel();
                }
            }
            Phase::Captured | Phase::Cancelled => break,
        }

        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Cancelling");
                handle.cancel();
            }
        }
    }

    gave_up
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn options(camera: PathBuf, retries: u8) -> CaptureOptions {
        CaptureOptions {
            camera,
            countdown: 1,
            retries,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_capture_reads_frame_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let image = capture(&options(path, 0)).await.unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.decode(), JPEG);
    }

    #[tokio::test]
    async fn test_missing_camera_gives_up_with_remedy() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-camera.jpg");

        let err = capture(&options(missing, 2)).await.unwrap_err();
        assert!(matches!(err, CliError::Camera(DeviceError::NotFound)));
    }
}
