//! File-backed camera.
//!
//! Treats an image file as a camera whose live feed is whatever the file
//! currently holds. Useful with tools that continuously dump webcam frames to
//! disk (e.g. `ffmpeg -f v4l2 -i /dev/video0 -update 1 /dev/shm/cam.jpg`) and
//! for terminals without a camera at all.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, instrument};

use crate::camera::{Camera, CameraStream, JpegQuality, Still};
use crate::error::DeviceError;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Largest frame a [`FileCamera`] will read by default (5 MiB).
pub const MAX_FRAME_BYTES: u64 = 5 * 1024 * 1024;

/// A camera whose frames are read from a file.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
    max_frame_bytes: u64,
}

impl FileCamera {
    /// Create a camera reading frames from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_frame_bytes: MAX_FRAME_BYTES,
        }
    }

    /// Reject frames larger than `limit` bytes.
    #[must_use]
    pub const fn with_max_frame_bytes(mut self, limit: u64) -> Self {
        self.max_frame_bytes = limit;
        self
    }

    /// The frame source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Camera for FileCamera {
    type Stream = FileStream;

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn acquire(&mut self) -> Result<FileStream, DeviceError> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| DeviceError::from_io(&e))?;
        let metadata = file.metadata().await.map_err(|e| DeviceError::from_io(&e))?;
        if metadata.is_dir() {
            return Err(DeviceError::Unknown(format!(
                "{} is a directory, not a frame source",
                self.path.display()
            )));
        }

        debug!("File camera opened");
        Ok(FileStream {
            path: self.path.clone(),
            file: Some(file),
            max_frame_bytes: self.max_frame_bytes,
        })
    }
}

/// An open [`FileCamera`] feed.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    file: Option<File>,
    max_frame_bytes: u64,
}

impl FileStream {
    /// Whether the stream still holds the file open.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.file.is_some()
    }
}

impl CameraStream for FileStream {
    async fn capture_still(&mut self, quality: JpegQuality) -> Result<Still, DeviceError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| DeviceError::Unknown("stream already stopped".to_string()))?;

        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| DeviceError::from_io(&e))?;
        // One byte past the limit tells an oversized frame from one that fits exactly
        let mut bytes = Vec::new();
        file.take(self.max_frame_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| DeviceError::from_io(&e))?;
        if bytes.len() as u64 > self.max_frame_bytes {
            return Err(DeviceError::Unknown(format!(
                "frame is larger than {} bytes",
                self.max_frame_bytes
            )));
        }

        // Frames on disk are already encoded; the requested quality only
        // applies to devices that encode on capture.
        debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            quality = quality.get(),
            "Frame read"
        );

        if bytes.starts_with(JPEG_MAGIC) {
            Ok(Still::jpeg(bytes))
        } else if bytes.starts_with(PNG_MAGIC) {
            Ok(Still {
                mime_type: "image/png",
                bytes,
            })
        } else if bytes.is_empty() {
            Err(DeviceError::Unknown("camera produced an empty frame".to_string()))
        } else {
            Err(DeviceError::Unknown(
                "frame is neither JPEG nor PNG".to_string(),
            ))
        }
    }

    fn stop(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), "File camera released");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn frame_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FileCamera::new(dir.path().join("nope.jpg"));

        let err = camera.acquire().await.unwrap_err();
        assert_eq!(err, DeviceError::NotFound);
    }

    #[tokio::test]
    async fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FileCamera::new(dir.path());

        let err = camera.acquire().await.unwrap_err();
        assert!(matches!(err, DeviceError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_captures_jpeg_frame() {
        let file = frame_file(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);
        let mut camera = FileCamera::new(file.path());

        let mut stream = camera.acquire().await.unwrap();
        let still = stream.capture_still(JpegQuality::default()).await.unwrap();

        assert_eq!(still.mime_type, "image/jpeg");
        assert_eq!(still.bytes.len(), 7);
    }

    #[tokio::test]
    async fn test_rejects_oversized_frame() {
        let file = frame_file(&[0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4]);
        let mut camera = FileCamera::new(file.path()).with_max_frame_bytes(7);

        let mut stream = camera.acquire().await.unwrap();
        let err = stream.capture_still(JpegQuality::default()).await.unwrap_err();
        assert!(matches!(err, DeviceError::Unknown(msg) if msg.contains("larger than 7 bytes")));

        // A frame that fits exactly is still captured
        let mut camera = FileCamera::new(file.path()).with_max_frame_bytes(8);
        let mut stream = camera.acquire().await.unwrap();
        let still = stream.capture_still(JpegQuality::default()).await.unwrap();
        assert_eq!(still.bytes.len(), 8);
    }

    #[tokio::test]
    async fn test_rejects_unknown_format() {
        let file = frame_file(b"not an image");
        let mut camera = FileCamera::new(file.path());

        let mut stream = camera.acquire().await.unwrap();
        let err = stream.capture_still(JpegQuality::default()).await.unwrap_err();
        assert!(matches!(err, DeviceError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_stop_releases_file_and_is_idempotent() {
        let file = frame_file(&[0xFF, 0xD8, 0xFF, 0xDB]);
        let mut camera = FileCamera::new(file.path());

        let mut stream = camera.acquire().await.unwrap();
        assert!(stream.is_live());
        stream.stop();
        stream.stop();
        assert!(!stream.is_live());

        let err = stream.capture_still(JpegQuality::default()).await.unwrap_err();
        assert!(matches!(err, DeviceError::Unknown(_)));
    }
}
