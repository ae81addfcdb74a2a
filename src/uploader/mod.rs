//! Image upload: turning a local file reference into a durable public URL.
//!
//! [`ImagePolicy`] decides whether a field value is already a durable remote URL
//! or a local reference that still has to be uploaded. [`ImageUploader`]
//! implementations perform the upload.

/// Uploads to a Cloudinary-style unsigned upload endpoint
pub mod cloudinary;

pub use cloudinary::CloudinaryUploader;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Scheme prefix for references produced by a local file picker.
const FILE_SCHEME: &str = "file://";

/// Produces a public URL for a local image. No retry, no dedup.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Uploads `image` and returns its public URL.
    ///
    /// # Errors
    /// Returns [`Error::Upload`] if the file cannot be read or the service fails.
    async fn upload(&self, image: &LocalImage) -> Result<String>;
}

/// Uploader used when no image service is configured; every upload fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledUploader;

#[async_trait]
impl ImageUploader for DisabledUploader {
    async fn upload(&self, image: &LocalImage) -> Result<String> {
        Err(Error::upload(format!(
            "cannot upload '{}': image uploads are not configured \
             (set CLOUDINARY_CLOUD_NAME and CLOUDINARY_UPLOAD_PRESET)",
            image.reference()
        )))
    }
}

/// A reference to image bytes on this machine that are not yet durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    reference: String,
}

impl LocalImage {
    /// Wraps a local reference such as `file:///tmp/a.jpg` or `./a.png`.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// The reference as the caller supplied it.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Resolves the reference to a filesystem path.
    ///
    /// # Errors
    /// Returns [`Error::Upload`] for schemes other than `file://`.
    pub fn path(&self) -> Result<PathBuf> {
        if let Some(rest) = self.reference.strip_prefix(FILE_SCHEME) {
            return Ok(PathBuf::from(rest));
        }
        if self.reference.contains("://") {
            return Err(Error::upload(format!(
                "cannot read '{}': only file:// references and plain paths are supported",
                self.reference
            )));
        }
        Ok(PathBuf::from(&self.reference))
    }

    /// File name sent along with the bytes.
    #[must_use]
    pub fn file_name(&self) -> String {
        let trimmed = self
            .reference
            .strip_prefix(FILE_SCHEME)
            .unwrap_or(&self.reference);
        Path::new(trimmed)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("image.jpg")
            .to_string()
    }

    /// MIME type guessed from the extension; JPEG when unknown.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("heic") => "image/heic",
            _ => "image/jpeg",
        }
    }

    /// Reads the referenced bytes.
    ///
    /// # Errors
    /// Returns [`Error::Upload`] if the reference cannot be resolved or read.
    pub async fn read(&self) -> Result<Vec<u8>> {
        let path = self.path()?;
        tokio::fs::read(&path).await.map_err(|e| {
            Error::upload(format!("cannot read image '{}': {e}", path.display()))
        })
    }
}

/// What an image field currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Nothing (empty string)
    Empty,
    /// A durable remote URL; store as-is
    Remote(String),
    /// A local reference; upload before storing
    Local(LocalImage),
}

/// The configurable "is this a durable remote URL" predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePolicy {
    remote_prefixes: Vec<String>,
}

impl ImagePolicy {
    /// Builds a policy from URL prefixes that mark a value as durable.
    /// Prefixes are compared case-insensitively.
    #[must_use]
    pub fn new(remote_prefixes: Vec<String>) -> Self {
        Self {
            remote_prefixes: remote_prefixes
                .into_iter()
                .map(|prefix| prefix.to_ascii_lowercase())
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        }
    }

    /// True when `value` already points at durable remote storage.
    #[must_use]
    pub fn is_remote(&self, value: &str) -> bool {
        let lowered = value.trim().to_ascii_lowercase();
        self.remote_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(prefix.as_str()))
    }

    /// Classifies an image field value.
    #[must_use]
    pub fn classify(&self, value: &str) -> ImageSource {
        let value = value.trim();
        if value.is_empty() {
            ImageSource::Empty
        } else if self.is_remote(value) {
            ImageSource::Remote(value.to_string())
        } else {
            ImageSource::Local(LocalImage::new(value))
        }
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::new(vec!["https://".to_string(), "http://".to_string()])
    }
}
