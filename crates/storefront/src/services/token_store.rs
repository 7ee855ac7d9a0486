//! Authentication token storage.
//!
//! A store holds at most one opaque bearer token. It is created with the
//! session it belongs to (browser session, CLI token file, test) and handed
//! explicitly to whatever needs the token; there is no process-global token.
//!
//! # Implementations
//!
//! - [`MemoryTokenStore`] - process-local, for tests and embedders
//! - [`SessionTokenStore`] - the token of one browser session
//!
//! The CLI ships its own file-backed store.

use std::future::Future;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::RwLock;
use tower_sessions::Session;

use crate::models::session_keys;

/// Errors raised by the storage behind a token store.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The session backend failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The token file could not be read or written.
    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holder of the current authentication token.
///
/// `read` returns `Ok(None)` when nothing is stored; absence is not an error.
pub trait TokenStore: Send + Sync {
    /// Store a token, replacing any previous one.
    fn save(&self, token: SecretString) -> impl Future<Output = Result<(), TokenStoreError>> + Send;

    /// The stored token, if any.
    fn read(&self) -> impl Future<Output = Result<Option<SecretString>, TokenStoreError>> + Send;

    /// Forget the stored token. Clearing an empty store is fine.
    fn clear(&self) -> impl Future<Output = Result<(), TokenStoreError>> + Send;

    /// Whether a token is stored.
    fn is_present(&self) -> impl Future<Output = Result<bool, TokenStoreError>> + Send {
        async { Ok(self.read().await?.is_some()) }
    }
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// In-memory token store. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<SecretString>>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: SecretString) -> Result<(), TokenStoreError> {
        *self.slot.write().await = Some(token);
        Ok(())
    }

    async fn read(&self) -> Result<Option<SecretString>, TokenStoreError> {
        Ok(self.slot.read().await.clone())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.slot.write().await = None;
        Ok(())
    }
}

// =============================================================================
// SessionTokenStore
// =============================================================================

/// Token store backed by a browser session.
#[derive(Clone)]
pub struct SessionTokenStore {
    session: Session,
}

impl SessionTokenStore {
    /// Wrap the session of the current request.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl TokenStore for SessionTokenStore {
    async fn save(&self, token: SecretString) -> Result<(), TokenStoreError> {
        // Rotate the session ID on privilege change
        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::AUTH_TOKEN, token.expose_secret())
            .await?;
        Ok(())
    }

    async fn read(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let token: Option<String> = self.session.get(session_keys::AUTH_TOKEN).await?;
        Ok(token.map(SecretString::from))
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        self.session
            .remove::<String>(session_keys::AUTH_TOKEN)
            .await?;
        Ok(())
    }
}
