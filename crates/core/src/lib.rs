//! Ecomai Core - Shared types library.
//!
//! This crate provides the value types used across all Ecomai components:
//! - `capture` - Camera capture controller for face login
//! - `storefront` - Public-facing web frontend and backend clients
//! - `cli` - Terminal client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no timers.
//! Products and carts are plain records mirrored from the backend API; the
//! backend remains the only source of truth for them.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, catalog and cart records, image payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
