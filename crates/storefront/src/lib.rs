//! Ecomai Storefront library.
//!
//! Server-rendered shop front for the Ecomai commerce backend: product
//! browsing, cart, password and face login, and the shopping assistant.
//! Prices, stock, accounts and face matching all live in the backend; this
//! crate orchestrates requests to it.
//!
//! The crate is a library so the terminal client and the integration tests
//! can reuse the backend clients, the token stores and the router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
