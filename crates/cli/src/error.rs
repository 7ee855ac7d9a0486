//! CLI error type.

use ecomai_capture::DeviceError;
use ecomai_storefront::backend::BackendError;
use ecomai_storefront::services::ShopError;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A remote call failed. Server messages are shown verbatim.
    #[error("{}", .0.user_message())]
    Shop(#[from] ShopError),

    /// The assistant or backend client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] BackendError),

    /// The camera gave up after all retries.
    #[error("{}: {}", .0, .0.remedy())]
    Camera(DeviceError),

    /// The capture was cancelled before a photo was taken.
    #[error("Capture cancelled")]
    CaptureCancelled,

    /// The capture task panicked or was aborted.
    #[error("Capture task failed: {0}")]
    CaptureTask(#[from] tokio::task::JoinError),

    /// An argument could not be parsed.
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    /// Writing to the terminal failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    /// Build an input error for `field`.
    pub fn invalid(field: &'static str, message: impl ToString) -> Self {
        Self::InvalidInput {
            field,
            message: message.to_string(),
        }
    }

    /// Whether logging in again would fix this.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        match self {
            Self::Shop(err) => err.is_auth(),
            _ => false,
        }
    }
}
