//! Image service settings from environment variables.

use crate::errors::Result;
use crate::uploader::{CloudinaryUploader, DisabledUploader, ImageUploader, cloudinary};
use std::sync::Arc;
use tracing::{info, warn};

/// Credentials for unsigned uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// `CLOUDINARY_CLOUD_NAME`
    pub cloud_name: String,
    /// `CLOUDINARY_UPLOAD_PRESET`
    pub upload_preset: String,
    /// `CLOUDINARY_BASE_URL`, defaulting to the public API host
    pub base_url: String,
}

/// Reads the uploader settings through `var`; `None` unless both the cloud name
/// and the upload preset are set.
pub fn uploader_config_from<F: Fn(&str) -> Option<String>>(var: F) -> Option<UploaderConfig> {
    let non_empty = |name: &str| var(name).filter(|value| !value.trim().is_empty());
    Some(UploaderConfig {
        cloud_name: non_empty("CLOUDINARY_CLOUD_NAME")?,
        upload_preset: non_empty("CLOUDINARY_UPLOAD_PRESET")?,
        base_url: non_empty("CLOUDINARY_BASE_URL")
            .unwrap_or_else(|| cloudinary::DEFAULT_BASE_URL.to_string()),
    })
}

/// Reads the uploader settings from the process environment.
#[must_use]
pub fn get_uploader_config() -> Option<UploaderConfig> {
    uploader_config_from(|name| std::env::var(name).ok())
}

/// Builds the configured uploader, or one that refuses every upload.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn build_uploader(config: Option<&UploaderConfig>) -> Result<Arc<dyn ImageUploader>> {
    let Some(config) = config else {
        warn!("Image service not configured; records with local images cannot be saved");
        return Ok(Arc::new(DisabledUploader));
    };
    let uploader =
        CloudinaryUploader::with_base_url(&config.base_url, &config.cloud_name, &config.upload_preset)?;
    info!("Uploading images to {}", uploader.endpoint());
    Ok(Arc::new(uploader))
}
