//! Product model - an item for sale in the shop catalog.

use crate::errors::{Error, Result};
use crate::models::{Entity, EntitySchema, lenient};
use serde::{Deserialize, Serialize};

const PRODUCT_FIELDS: &[&str] = &["name", "price", "description", "image", "category"];

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Display name (e.g. "Pen")
    pub name: String,
    /// Unit price; text input such as `"1.5"` is accepted on read
    #[serde(deserialize_with = "lenient::number")]
    pub price: f64,
    /// Free-form description
    pub description: String,
    /// Public image URL
    pub image: String,
    /// Category title the product is listed under
    pub category: String,
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const SCHEMA: EntitySchema =
        EntitySchema::new(PRODUCT_FIELDS, PRODUCT_FIELDS).with_image("image");

    fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::validation(
                "price",
                format!("{} is not a valid price", self.price),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_accepts_numeric_text() {
        let product: Product = serde_json::from_value(json!({
            "name": "Pen",
            "price": "1.5",
            "description": "Blue pen",
            "image": "https://cdn/x.jpg",
            "category": "Stationery"
        }))
        .unwrap();
        assert_eq!(product.price, 1.5);
    }

    #[test]
    fn test_price_rejects_words() {
        let result = serde_json::from_value::<Product>(json!({
            "name": "Pen",
            "price": "cheap",
            "description": "Blue pen",
            "image": "https://cdn/x.jpg",
            "category": "Stationery"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_price_range() {
        let mut product = Product {
            name: "Pen".into(),
            price: 1.5,
            description: "Blue pen".into(),
            image: "https://cdn/x.jpg".into(),
            category: "Stationery".into(),
        };
        assert!(product.validate().is_ok());

        product.price = -1.0;
        assert!(product.validate().unwrap_err().is_validation());

        product.price = f64::NAN;
        assert!(product.validate().unwrap_err().is_validation());
    }
}
