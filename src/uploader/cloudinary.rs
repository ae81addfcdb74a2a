//! Unsigned uploads to a Cloudinary-style image service.
//!
//! One multipart `POST` per image: the file bytes plus an upload preset. The
//! JSON response carries the public URL in `secure_url`.

use crate::errors::{Error, Result};
use crate::uploader::{ImageUploader, LocalImage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Public API host used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// [`ImageUploader`] that posts to `{base}/v1_1/{cloud_name}/image/upload`.
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

impl CloudinaryUploader {
    /// Creates an uploader for the public service.
    ///
    /// # Errors
    /// Returns [`Error::Config`] on empty settings or [`Error::Http`] if the
    /// client cannot be built.
    pub fn new(cloud_name: &str, upload_preset: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, cloud_name, upload_preset)
    }

    /// Creates an uploader against a different host (self-hosted proxy, tests).
    ///
    /// # Errors
    /// Returns [`Error::Config`] on empty settings or [`Error::Http`] if the
    /// client cannot be built.
    pub fn with_base_url(base_url: &str, cloud_name: &str, upload_preset: &str) -> Result<Self> {
        if cloud_name.trim().is_empty() || upload_preset.trim().is_empty() {
            return Err(Error::Config {
                message: "image service needs both a cloud name and an upload preset".to_string(),
            });
        }
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint: format!(
                "{}/v1_1/{}/image/upload",
                base_url.trim_end_matches('/'),
                cloud_name.trim()
            ),
            upload_preset: upload_preset.trim().to_string(),
        })
    }

    /// The upload URL this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    #[instrument(skip(self, image), fields(reference = image.reference()))]
    async fn upload(&self, image: &LocalImage) -> Result<String> {
        let bytes = image.read().await?;
        debug!(size = bytes.len(), "uploading image");

        let file = Part::bytes(bytes)
            .file_name(image.file_name())
            .mime_str(image.mime_type())
            .map_err(|e| Error::upload(format!("invalid content type: {e}")))?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::upload(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upload(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| format!("service returned {status}: {body}"),
                |parsed| format!("service returned {status}: {}", parsed.error.message),
            );
            warn!(%status, "image upload rejected");
            return Err(Error::Upload { message });
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| Error::upload(format!("unreadable response: {e}")))?;
        let url = parsed
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::upload("response did not include a secure_url"))?;

        info!(%url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_image() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"fake-jpeg-bytes").unwrap();
        file
    }

    #[test]
    fn test_endpoint_shape() {
        let uploader =
            CloudinaryUploader::with_base_url("https://api.example.com/", "demo", "preset").unwrap();
        assert_eq!(
            uploader.endpoint(),
            "https://api.example.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_missing_settings_are_config_errors() {
        assert!(matches!(
            CloudinaryUploader::new("", "preset"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            CloudinaryUploader::new("demo", "  "),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("upload_preset"))
            .and(body_string_contains("admin-preset"))
            .and(body_string_contains("fake-jpeg-bytes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"secure_url": "https://cdn/x.jpg", "public_id": "x"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let file = temp_image();
        let uploader = CloudinaryUploader::with_base_url(&server.uri(), "demo", "admin-preset")?;
        let image = LocalImage::new(format!("file://{}", file.path().display()));

        let url = uploader.upload(&image).await?;
        assert_eq!(url, "https://cdn/x.jpg");
        Ok(())
    }

    #[tokio::test]
    async fn test_rejection_is_upload_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "Upload preset not found"}})),
            )
            .mount(&server)
            .await;

        let file = temp_image();
        let uploader = CloudinaryUploader::with_base_url(&server.uri(), "demo", "wrong")?;
        let image = LocalImage::new(file.path().display().to_string());

        let err = uploader.upload(&image).await.unwrap_err();
        assert!(matches!(err, Error::Upload { .. }));
        assert!(err.to_string().contains("Upload preset not found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_secure_url_is_upload_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_id": "x"})))
            .mount(&server)
            .await;

        let file = temp_image();
        let uploader = CloudinaryUploader::with_base_url(&server.uri(), "demo", "preset")?;
        let image = LocalImage::new(file.path().display().to_string());

        assert!(matches!(
            uploader.upload(&image).await,
            Err(Error::Upload { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_file_sends_nothing() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::with_base_url(&server.uri(), "demo", "preset")?;
        let image = LocalImage::new("file:///no/such/image.jpg");
        assert!(matches!(
            uploader.upload(&image).await,
            Err(Error::Upload { .. })
        ));
        Ok(())
    }
}
