//! Catalog commands. None of them need a login.

use std::io::Write;

use ecomai_core::ProductId;

use super::Context;
use crate::error::CliError;
use crate::output;

/// Which slice of the catalog to list.
#[derive(Debug, Clone)]
pub enum Listing {
    All,
    Offers,
    Category(String),
    Search(String),
}

/// Print a product listing.
///
/// # Errors
///
/// Returns error if the backend call fails.
pub async fn list(ctx: &Context, listing: Listing, out: &mut impl Write) -> Result<(), CliError> {
    let products = match &listing {
        Listing::All => ctx.shop.products().await?,
        Listing::Offers => ctx.shop.offers().await?,
        Listing::Category(category) => ctx.shop.products_by_category(category).await?,
        Listing::Search(query) => {
            let query = query.trim();
            if query.is_empty() {
                return Err(CliError::invalid("query", "must not be empty"));
            }
            ctx.shop.search(query).await?
        }
    };
    tracing::debug!(?listing, count = products.len(), "Products fetched");
    output::products(out, &products)?;
    Ok(())
}

/// Print one product.
///
/// # Errors
///
/// Returns error if the product does not exist or the call fails.
pub async fn show(ctx: &Context, id: ProductId, out: &mut impl Write) -> Result<(), CliError> {
    let product = ctx.shop.product(id).await?;
    output::product(out, &product)?;
    Ok(())
}
