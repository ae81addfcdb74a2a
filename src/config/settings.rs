//! Application settings loaded from `config.toml`.
//!
//! The file is optional. When it is missing every section falls back to its
//! default; when it exists but cannot be parsed, loading fails.

use crate::errors::{Error, Result};
use crate::uploader::ImagePolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default settings file location.
pub const DEFAULT_SETTINGS_PATH: &str = "config.toml";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Image field handling
    pub images: ImageSettings,
    /// Categories created by `shop-admin seed`
    pub categories: Vec<CategorySeed>,
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Prefixes marking a value as an already-uploaded remote URL
    pub remote_prefixes: Vec<String>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            remote_prefixes: vec!["https://".to_string(), "http://".to_string()],
        }
    }
}

impl ImageSettings {
    /// The image policy these settings describe.
    #[must_use]
    pub fn policy(&self) -> ImagePolicy {
        ImagePolicy::new(self.remote_prefixes.clone())
    }
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategorySeed {
    /// Category title, unique case-insensitively
    pub title: String,
    /// Image URL or local file reference
    pub image: String,
}

/// Loads settings from `path`; a missing file yields the defaults.
///
/// # Errors
/// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(Error::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            });
        }
    };

    let settings: Settings = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })?;
    info!(
        "Loaded settings from {} ({} category seeds)",
        path.display(),
        settings.categories.len()
    );
    Ok(settings)
}

/// Resolves the settings path from `SHOP_ADMIN_CONFIG` via `var`.
pub fn settings_path_from<F: Fn(&str) -> Option<String>>(var: F) -> PathBuf {
    var("SHOP_ADMIN_CONFIG")
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH), PathBuf::from)
}

/// Loads settings from `SHOP_ADMIN_CONFIG`, or `./config.toml` when unset.
///
/// # Errors
/// Returns [`Error::Config`] if the file exists but is invalid.
pub fn load_default_settings() -> Result<Settings> {
    load_settings(settings_path_from(|name| std::env::var(name).ok()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_settings() {
        let toml_str = r#"
            [images]
            remote_prefixes = ["https://res.cloudinary.com/"]

            [[categories]]
            title = "Stationery"
            image = "https://cdn/stationery.jpg"

            [[categories]]
            title = "Books"
            image = "file://seed/books.jpg"
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.categories.len(), 2);
        assert_eq!(settings.categories[1].title, "Books");
        assert!(settings.images.policy().is_remote("https://res.cloudinary.com/x.jpg"));
        assert!(!settings.images.policy().is_remote("https://elsewhere/x.jpg"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.categories.is_empty());
        assert_eq!(settings.images.remote_prefixes, vec!["https://", "http://"]);
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = load_settings(dir.path().join("absent.toml"))?;
        assert!(settings.categories.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_config_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"[[categories]]\ntitle = 3\n")?;
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        Ok(())
    }

    #[test]
    fn test_settings_path_from_env() {
        assert_eq!(settings_path_from(|_| None), PathBuf::from("config.toml"));
        assert_eq!(
            settings_path_from(|_| Some("/etc/shop/admin.toml".into())),
            PathBuf::from("/etc/shop/admin.toml")
        );
    }
}
