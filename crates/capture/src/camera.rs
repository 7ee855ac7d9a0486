//! Camera device abstraction.

use std::future::Future;

use crate::error::DeviceError;

/// JPEG quality (1-100) requested from the device when a still is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JpegQuality(u8);

impl JpegQuality {
    /// Highest quality.
    pub const MAX: Self = Self(100);

    /// Create a quality value, returning `None` outside 1..=100.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if matches!(value, 1..=100) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The quality as a percentage.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for JpegQuality {
    /// 80, good enough for face comparison at a fraction of the size.
    fn default() -> Self {
        Self(80)
    }
}

/// A single encoded frame read from a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Still {
    /// MIME type of `bytes` (e.g. `image/jpeg`).
    pub mime_type: &'static str,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl Still {
    /// A JPEG frame.
    #[must_use]
    pub const fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "image/jpeg",
            bytes,
        }
    }
}

/// A camera that can be opened for exclusive use.
pub trait Camera: Send {
    /// The live stream handed out by a successful acquisition.
    type Stream: CameraStream;

    /// Open the device. May wait on a permission prompt.
    fn acquire(&mut self) -> impl Future<Output = Result<Self::Stream, DeviceError>> + Send;
}

/// An open, live camera stream.
pub trait CameraStream: Send {
    /// Read one frame from the live feed, encoded as a still image.
    ///
    /// The frame is returned in sensor orientation; preview mirroring is a
    /// display concern and never applied here.
    fn capture_still(
        &mut self,
        quality: JpegQuality,
    ) -> impl Future<Output = Result<Still, DeviceError>> + Send;

    /// Stop the stream and release the device.
    fn stop(&mut self);
}
