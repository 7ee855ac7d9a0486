//! Command implementations.
//!
//! Every command receives a [`Context`] built once from the global flags:
//! the shop service bound to the token file and the assistant client.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod face;
pub mod products;

use ecomai_storefront::backend::{BackendClient, BackendError, ChatClient};
use ecomai_storefront::config::BackendConfig;
use ecomai_storefront::services::ShopService;

use crate::token_file::FileTokenStore;

/// The shop service of a CLI invocation.
pub type CliShop = ShopService<FileTokenStore>;

/// Clients shared by all commands.
pub struct Context {
    pub shop: CliShop,
    pub chat: ChatClient,
}

impl Context {
    /// Build the clients.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig, tokens: FileTokenStore) -> Result<Self, BackendError> {
        Ok(Self {
            shop: ShopService::new(BackendClient::new(config)?, tokens),
            chat: ChatClient::new(config)?,
        })
    }
}
