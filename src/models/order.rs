//! Order model - placed by shoppers, read-only for administrators.

use crate::models::{Entity, EntitySchema, lenient};
use serde::{Deserialize, Serialize};

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Key of the ordered product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Product name at the time of ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unit price at the time of ordering
    #[serde(
        default,
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    /// Units ordered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// A shopper's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Key of the ordering user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Order total
    #[serde(
        default,
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<f64>,
    /// Fulfilment status as written by the shop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Epoch milliseconds when the order was placed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    const SCHEMA: EntitySchema =
        EntitySchema::new(&["userId", "items", "total", "status", "createdAt"], &[]).read_only();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_order_decodes() {
        let order: Order = serde_json::from_value(json!({
            "userId": "u1",
            "items": [{"productId": "p1", "price": "2.5", "quantity": 2}],
            "total": 5
        }))
        .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].price, Some(2.5));
        assert_eq!(order.total, Some(5.0));
        assert_eq!(order.created_at, None);
    }
}
