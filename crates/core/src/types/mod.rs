//! Core types for Ecomai.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod image;
pub mod price;
pub mod product;

pub use cart::{Cart, CartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use image::{ImageDataUrl, ImageDataUrlError};
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product};
