//! Camera device error taxonomy.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Why the camera could not be used.
///
/// Every variant is retryable by re-running acquisition; each one carries a
/// distinct remedy so the user knows what to fix before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The user or the OS refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No camera device exists.
    #[error("no camera found")]
    NotFound,

    /// The camera is held by another application.
    #[error("camera is in use by another application")]
    Busy,

    /// Acquisition did not complete in time (e.g. an unanswered permission prompt).
    #[error("camera did not respond within {}s", .0.as_secs())]
    TimedOut(Duration),

    /// Anything else.
    #[error("camera error: {0}")]
    Unknown(String),
}

impl DeviceError {
    /// Classify an OS-level I/O error raised while opening or reading a device.
    #[must_use]
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::ResourceBusy => Self::Busy,
            _ => Self::Unknown(err.to_string()),
        }
    }

    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "device-not-found",
            Self::Busy => "device-busy",
            Self::TimedOut(_) => "timed-out",
            Self::Unknown(_) => "unknown",
        }
    }

    /// User-facing recovery guidance.
    #[must_use]
    pub const fn remedy(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was denied. Allow camera access in your browser or system settings, then retry."
            }
            Self::NotFound => "No camera was found on this device. Connect a camera, then retry.",
            Self::Busy => {
                "The camera is being used by another application. Close it, then retry."
            }
            Self::TimedOut(_) => {
                "The camera did not respond. Answer the permission prompt or reconnect the camera, then retry."
            }
            Self::Unknown(_) => "The camera could not be accessed. Check its permissions, then retry.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let missing = io::Error::from(io::ErrorKind::NotFound);
        let busy = io::Error::from(io::ErrorKind::ResourceBusy);
        let other = io::Error::other("ioctl failed");

        assert_eq!(DeviceError::from_io(&denied), DeviceError::PermissionDenied);
        assert_eq!(DeviceError::from_io(&missing), DeviceError::NotFound);
        assert_eq!(DeviceError::from_io(&busy), DeviceError::Busy);
        assert!(matches!(
            DeviceError::from_io(&other),
            DeviceError::Unknown(msg) if msg.contains("ioctl failed")
        ));
    }

    #[test]
    fn test_each_reason_has_distinct_remedy_and_code() {
        let all = [
            DeviceError::PermissionDenied,
            DeviceError::NotFound,
            DeviceError::Busy,
            DeviceError::TimedOut(Duration::from_secs(30)),
            DeviceError::Unknown("x".to_string()),
        ];

        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.remedy(), b.remedy());
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_timed_out_display() {
        let err = DeviceError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "camera did not respond within 30s");
    }
}
