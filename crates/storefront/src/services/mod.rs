//! Session-bound services.
//!
//! - [`token_store`] - where the bearer token of a session lives
//! - [`shop`] - backend operations that read and write that token

pub mod shop;
pub mod token_store;

pub use shop::{ShopError, ShopService, WebShop};
pub use token_store::{MemoryTokenStore, SessionTokenStore, TokenStore, TokenStoreError};
