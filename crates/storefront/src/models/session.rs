//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use ecomai_core::Email;

/// Session-stored identity of the logged-in shopper.
///
/// Kept next to the bearer token so pages can greet the shopper without a
/// backend round trip. The token, not this record, decides what the backend
/// allows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Email used to log in.
    pub email: Email,
    /// Name given at registration, when known.
    #[serde(default)]
    pub full_name: Option<String>,
}

impl CurrentUser {
    /// Name to show in page chrome.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or_else(|| self.email.as_str())
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Shopper,
    Assistant,
}

/// One message of the assistant conversation kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatTurn {
    /// Whether the shopper wrote this message.
    #[must_use]
    pub fn is_shopper(&self) -> bool {
        self.speaker == Speaker::Shopper
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the backend bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Key for the assistant conversation.
    pub const CHAT_HISTORY: &str = "chat_history";
}
