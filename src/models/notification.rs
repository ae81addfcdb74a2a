//! Notification model - an append-only broadcast message.

use crate::models::{Entity, EntitySchema};
use serde::{Deserialize, Serialize};

/// A message pushed to every shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Headline
    pub title: String,
    /// Message text
    pub body: String,
    /// Epoch milliseconds, stamped when the notification is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Entity for Notification {
    const COLLECTION: &'static str = "notifications";
    const SCHEMA: EntitySchema =
        EntitySchema::new(&["title", "body", "createdAt"], &["title", "body"]).stamped("createdAt");
}
