//! Catalog records.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by the backend catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub discount_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

impl Product {
    /// The price a customer actually pays: the discount price when one is set
    /// and lower than the list price.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        match self.discount_price {
            Some(discount) if discount < self.price => discount,
            _ => self.price,
        }
    }

    /// Whether the product is currently discounted.
    #[must_use]
    pub fn is_on_offer(&self) -> bool {
        self.effective_price() < self.price
    }

    /// Whether any units are left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields for creating a product through the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount_price: Option<Price>,
    pub image_url: String,
    pub category: String,
    pub stock: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Auriculares",
            "description": "Bluetooth",
            "price": 59.90,
            "discountPrice": 49.90,
            "imageUrl": "https://img.example/1.jpg",
            "category": "audio",
            "stock": 4
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let product = sample();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price.to_string(), "$59.90");
        assert_eq!(product.category.as_deref(), Some("audio"));
    }

    #[test]
    fn test_effective_price_prefers_lower_discount() {
        let product = sample();
        assert!(product.is_on_offer());
        assert_eq!(product.effective_price().to_string(), "$49.90");
    }

    #[test]
    fn test_discount_above_list_price_is_ignored() {
        let mut product = sample();
        product.discount_price = Some(Price::from_cents(9_000));
        assert!(!product.is_on_offer());
        assert_eq!(product.effective_price(), product.price);
    }

    #[test]
    fn test_optional_fields_default() {
        let product: Product =
            serde_json::from_str(r#"{"id": 2, "name": "Cable", "price": "3.50"}"#).unwrap();
        assert!(product.description.is_none());
        assert!(!product.in_stock());
    }

    #[test]
    fn test_new_product_serializes_camel_case() {
        let new_product = NewProduct {
            name: "Mouse".to_string(),
            description: String::new(),
            price: Price::from_cents(1500),
            discount_price: None,
            image_url: String::new(),
            category: "perifericos".to_string(),
            stock: 3,
        };
        let value = serde_json::to_value(&new_product).unwrap();
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("discountPrice").is_some());
    }
}
