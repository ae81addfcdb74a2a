//! Banner model - a promotional image on the shop's home screen.

use crate::models::{Entity, EntitySchema};
use serde::{Deserialize, Serialize};

/// A promotional banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    /// Headline
    pub title: String,
    /// Where tapping the banner leads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Public image URL
    pub image_url: String,
}

impl Entity for Banner {
    const COLLECTION: &'static str = "banners";
    const SCHEMA: EntitySchema =
        EntitySchema::new(&["title", "linkUrl", "imageUrl"], &["title", "imageUrl"])
            .with_image("imageUrl");
}
