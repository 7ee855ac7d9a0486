//! Plain-text rendering of catalog and cart records.
//!
//! IDs and prices are turned into strings first so column padding applies.

use std::io::{self, Write};

use ecomai_core::{Cart, Product};

/// One line per product: id, name, price, stock.
pub fn products(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in products {
        writeln!(
            out,
            "{:>6}  {:<40}  {:>10}  {}",
            product.id.to_string(),
            product.name,
            price_label(product),
            stock_label(product)
        )?;
    }
    Ok(())
}

/// Full product detail.
pub fn product(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    if let Some(category) = product.category.as_deref().filter(|c| !c.is_empty()) {
        writeln!(out, "Category: {category}")?;
    }
    if product.is_on_offer() {
        writeln!(out, "Price:    {} (was {})", product.effective_price(), product.price)?;
    } else {
        writeln!(out, "Price:    {}", product.price)?;
    }
    writeln!(out, "Stock:    {}", stock_label(product))?;
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out)?;
        writeln!(out, "{description}")?;
    }
    Ok(())
}

/// Cart lines followed by the total.
pub fn cart(out: &mut impl Write, cart: &Cart) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }
    for item in &cart.items {
        writeln!(
            out,
            "{:>6}  {:<40}  {:>3} x {:>10}  {:>10}",
            item.id.to_string(),
            item.product_name,
            item.quantity,
            item.product_price.to_string(),
            item.subtotal.to_string()
        )?;
    }
    writeln!(
        out,
        "{} item(s), total {}",
        cart.item_count(),
        cart.total_price
    )
}

fn price_label(product: &Product) -> String {
    if product.is_on_offer() {
        format!("{}*", product.effective_price())
    } else {
        product.price.to_string()
    }
}

fn stock_label(product: &Product) -> String {
    if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    }
}
