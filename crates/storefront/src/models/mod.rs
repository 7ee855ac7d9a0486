//! Session-stored models for the storefront.
//!
//! Catalog and cart records come from `ecomai_core`; this module only holds
//! what the storefront keeps in the browser session.

pub mod session;

pub use session::{ChatTurn, CurrentUser, Speaker, keys as session_keys};
