//! Ecomai Capture - camera capture controller for face login.
//!
//! Runs one round of "acquire camera → live preview → countdown → capture a
//! still → hand it back as a `data:` URL", with a cancel path at every stage
//! and a guaranteed device release on every exit path.
//!
//! # Architecture
//!
//! - [`Camera`] / [`CameraStream`] abstract the device. [`FileCamera`] is the
//!   bundled backend; the browser widget and tests provide their own.
//! - [`CaptureController`] is a single async task driven by commands sent
//!   through its [`CaptureHandle`]. Phase changes are published on a `watch`
//!   channel so a UI can render them.
//! - [`DeviceError`] classifies acquisition failures into user-actionable
//!   reasons, each with its own remedy text.
//!
//! # Example
//!
//! ```rust,ignore
//! use ecomai_capture::{CaptureConfig, CaptureController, CaptureOutcome, FileCamera};
//!
//! let (controller, handle) = CaptureController::new(FileCamera::new("/dev/shm/cam.jpg"), CaptureConfig::default());
//! let task = tokio::spawn(controller.run());
//! handle.begin_capture();
//! if let CaptureOutcome::Captured(image) = task.await? {
//!     client.biometric_login(&email, &image).await?;
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod camera;
pub mod controller;
pub mod error;
pub mod file_camera;

pub use camera::{Camera, CameraStream, JpegQuality, Still};
pub use controller::{CaptureConfig, CaptureController, CaptureHandle, CaptureOutcome, Phase};
pub use error::DeviceError;
pub use file_camera::{FileCamera, FileStream};
