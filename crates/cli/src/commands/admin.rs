//! Product administration commands.
//!
//! # Usage
//!
//! ```bash
//! ecomai admin create-product --name "Teclado" --price 25.00 \
//!     --discount-price 19.90 --category Electronics --stock 4
//!
//! ecomai admin delete-product 42
//! ```
//!
//! The backend decides whether the logged-in account may do this; its
//! refusal is printed as-is.

use std::io::Write;

use ecomai_core::{NewProduct, Price, ProductId};

use super::Context;
use crate::error::CliError;
use crate::output;

/// Arguments of `admin create-product`.
#[derive(Debug, Clone, Default)]
pub struct ProductArgs {
    pub name: String,
    pub description: String,
    pub price: String,
    pub discount_price: Option<String>,
    pub image_url: String,
    pub category: String,
    pub stock: i32,
}

impl ProductArgs {
    /// Validate into a backend request.
    ///
    /// # Errors
    ///
    /// Returns error on an empty name, an unparsable price or negative stock.
    pub fn into_new_product(self) -> Result<NewProduct, CliError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CliError::invalid("name", "must not be empty"));
        }
        if self.stock < 0 {
            return Err(CliError::invalid("stock", "must be 0 or more"));
        }
        let price: Price = self.price.parse().map_err(|e| CliError::invalid("price", e))?;
        let discount_price = self
            .discount_price
            .as_deref()
            .map(str::parse::<Price>)
            .transpose()
            .map_err(|e| CliError::invalid("discount price", e))?;

        Ok(NewProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            discount_price,
            image_url: self.image_url.trim().to_string(),
            category: self.category.trim().to_string(),
            stock: self.stock,
        })
    }
}

/// Create a product and print it.
///
/// # Errors
///
/// Returns error on invalid input, when logged out, or when refused.
pub async fn create_product(
    ctx: &Context,
    args: ProductArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let new_product = args.into_new_product()?;
    let product = ctx.shop.create_product(&new_product).await?;
    tracing::info!(product_id = %product.id, "Product created");
    output::product(out, &product)?;
    Ok(())
}

/// Delete a product.
///
/// # Errors
///
/// Returns error when logged out or when refused.
pub async fn delete_product(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    ctx.shop.delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}
