//! Category and brand models - the two titled, image-bearing catalog groupings.

use crate::models::{Entity, EntitySchema};
use serde::{Deserialize, Serialize};

/// A product category shown on the shop's home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Display title
    pub title: String,
    /// Public image URL
    pub image: String,
}

impl Entity for Category {
    const COLLECTION: &'static str = "categories";
    const SCHEMA: EntitySchema =
        EntitySchema::new(&["title", "image"], &["title", "image"]).with_image("image");
}

/// A brand; same shape as a category, separate collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    /// Display title
    pub title: String,
    /// Public logo URL
    pub image: String,
}

impl Entity for Brand {
    const COLLECTION: &'static str = "brands";
    const SCHEMA: EntitySchema =
        EntitySchema::new(&["title", "image"], &["title", "image"]).with_image("image");
}
