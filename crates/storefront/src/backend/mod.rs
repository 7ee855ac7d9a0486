//! HTTP clients for the remote services the storefront orchestrates.
//!
//! # Services
//!
//! - [`BackendClient`] - commerce backend (auth, products, cart, admin)
//! - [`ChatClient`] - shopping assistant service
//!
//! Every call is one request: build the URL, attach `Authorization: Bearer`
//! when the operation needs it, send, and map non-2xx responses to a
//! [`BackendError`] carrying the server's own message when it sent one.
//! Nothing is retried or cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use ecomai_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let token = client.login(&email, &password).await?;
//! let cart = client.add_to_cart(&token, product_id, 1).await?;
//! ```

mod chat;
mod client;
pub mod types;

pub use chat::{CHAT_APOLOGY, CHAT_GREETING, ChatClient};
pub use client::BackendClient;

use thiserror::Error;

/// Errors that can occur when talking to the remote services.
///
/// `Unauthorized` and `Api` display the server message verbatim so it can be
/// shown to the user as-is.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No token is stored; the request was never sent.
    #[error("Not authenticated")]
    MissingToken,

    /// The server rejected the credentials or token (401/403).
    #[error("{message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-2xx response.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A 2xx response whose body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Build the error for a non-2xx response.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// Whether the user needs to (re)authenticate.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Unauthorized { .. })
    }

    /// HTTP status returned by the server, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingToken => "Please log in to continue.".to_string(),
            Self::Unauthorized { message, .. } | Self::Api { message, .. } => message.clone(),
            Self::Http(_) => "The store is unreachable right now. Please try again.".to_string(),
            Self::Parse(_) => "The store sent an unexpected response.".to_string(),
        }
    }
}

/// Backend operations, used to pick a fallback error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Login,
    BiometricLogin,
    RegisterFace,
    ListProducts,
    Offers,
    Product,
    ProductsByCategory,
    SearchProducts,
    GetCart,
    AddToCart,
    UpdateCartItem,
    RemoveCartItem,
    ClearCart,
    CreateProduct,
    DeleteProduct,
}

impl Operation {
    /// Message used when the server does not provide one.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Register => "Registration failed",
            Self::Login => "Login failed",
            Self::BiometricLogin => "Biometric login failed",
            Self::RegisterFace => "Face registration failed",
            Self::ListProducts | Self::ProductsByCategory => "Failed to fetch products",
            Self::Offers => "Failed to fetch offers",
            Self::Product => "Failed to fetch product",
            Self::SearchProducts => "Failed to search products",
            Self::GetCart => "Failed to fetch cart",
            Self::AddToCart => "Failed to add to cart",
            Self::UpdateCartItem => "Failed to update cart item",
            Self::RemoveCartItem => "Failed to remove item",
            Self::ClearCart => "Failed to clear cart",
            Self::CreateProduct => "Failed to create product",
            Self::DeleteProduct => "Failed to delete product",
        }
    }
}

/// Pull the server's message out of an error body.
///
/// Looks for a non-empty `error` field, then `message`; anything else
/// (empty body, HTML, other JSON) yields the operation's fallback.
#[must_use]
pub fn error_message(body: &str, operation: Operation) -> String {
    serde_json::from_str::<types::ErrorBody>(body)
        .ok()
        .and_then(|body| {
            body.error
                .filter(|m| !m.trim().is_empty())
                .or_else(|| body.message.filter(|m| !m.trim().is_empty()))
        })
        .unwrap_or_else(|| operation.fallback_message().to_string())
}
