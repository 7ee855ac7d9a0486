//! Cart commands. All of them need a stored token.
//!
//! Every mutation prints the cart the backend returns, so the terminal
//! always shows the server's view.

use std::io::Write;

use ecomai_core::{CartItemId, ProductId};

use super::Context;
use crate::error::CliError;
use crate::output;

/// Print the cart.
///
/// # Errors
///
/// Returns error when logged out or the call fails.
pub async fn show(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let cart = ctx.shop.cart().await?;
    output::cart(out, &cart)?;
    Ok(())
}

/// Add units of a product.
///
/// # Errors
///
/// Returns error when logged out, the quantity is zero, or the call fails.
pub async fn add(
    ctx: &Context,
    product_id: ProductId,
    quantity: u32,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if quantity == 0 {
        return Err(CliError::invalid("quantity", "must be at least 1"));
    }
    let cart = ctx.shop.add_to_cart(product_id, quantity).await?;
    tracing::info!(product_id = %product_id, quantity, "Added to cart");
    output::cart(out, &cart)?;
    Ok(())
}

/// Change a line's quantity. Zero removes the line.
///
/// # Errors
///
/// Returns error when logged out or the call fails.
pub async fn update(
    ctx: &Context,
    item_id: CartItemId,
    quantity: u32,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let cart = if quantity == 0 {
        ctx.shop.remove_cart_item(item_id).await?
    } else {
        ctx.shop.update_cart_item(item_id, quantity).await?
    };
    output::cart(out, &cart)?;
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns error when logged out or the call fails.
pub async fn remove(ctx: &Context, item_id: CartItemId, out: &mut impl Write) -> Result<(), CliError> {
    let cart = ctx.shop.remove_cart_item(item_id).await?;
    output::cart(out, &cart)?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns error when logged out or the call fails.
pub async fn clear(ctx: &Context) -> Result<(), CliError> {
    ctx.shop.clear_cart().await?;
    tracing::info!("Cart cleared");
    Ok(())
}
