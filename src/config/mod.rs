//! Configuration: `.env` variables for services, `config.toml` for settings.

/// `config.toml` loading (image policy, category seeds)
pub mod settings;
/// Store back-end selection
pub mod store;
/// Image service credentials
pub mod uploader;

pub use settings::{CategorySeed, Settings, load_default_settings, load_settings};
pub use store::{StoreBackend, connect_store, get_store_backend};
pub use uploader::{UploaderConfig, build_uploader, get_uploader_config};
