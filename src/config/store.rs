//! Store back-end selection from environment variables.

use crate::errors::{Error, Result};
use crate::store::{MemoryStore, RecordStore, RestStore, SqliteStore};
use std::sync::Arc;
use tracing::info;

/// Local database used when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_admin.sqlite?mode=rwc";

/// Which [`RecordStore`] to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Local `SQLite` file
    Sqlite {
        /// `SeaORM` connection string
        database_url: String,
    },
    /// Process-local tree, lost on exit
    Memory,
    /// Hosted realtime database over REST
    Rest {
        /// Database root URL
        url: String,
        /// Credential sent as the `auth` query parameter
        auth_token: Option<String>,
    },
}

/// Reads `STORE_BACKEND` and the variables that back-end needs through `var`.
///
/// # Errors
/// Returns [`Error::Config`] for an unknown back-end name, or when `rest` is
/// selected without `STORE_URL`.
pub fn store_backend_from<F: Fn(&str) -> Option<String>>(var: F) -> Result<StoreBackend> {
    let non_empty = |name: &str| var(name).filter(|value| !value.trim().is_empty());

    let kind = non_empty("STORE_BACKEND").unwrap_or_else(|| "sqlite".to_string());
    match kind.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(StoreBackend::Sqlite {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        }),
        "memory" => Ok(StoreBackend::Memory),
        "rest" => {
            let url = non_empty("STORE_URL").ok_or_else(|| Error::Config {
                message: "STORE_BACKEND=rest needs STORE_URL".to_string(),
            })?;
            Ok(StoreBackend::Rest {
                url,
                auth_token: non_empty("STORE_AUTH_TOKEN"),
            })
        }
        other => Err(Error::Config {
            message: format!("Unknown STORE_BACKEND '{other}' (expected sqlite, memory or rest)"),
        }),
    }
}

/// Reads the store back-end from the process environment.
///
/// # Errors
/// See [`store_backend_from`].
pub fn get_store_backend() -> Result<StoreBackend> {
    store_backend_from(|name| std::env::var(name).ok())
}

/// Opens the selected back-end.
///
/// # Errors
/// Returns [`Error::Config`] for a bad store URL or [`Error::Database`] if the
/// local database cannot be opened.
pub async fn connect_store(backend: &StoreBackend) -> Result<Arc<dyn RecordStore>> {
    match backend {
        StoreBackend::Sqlite { database_url } => {
            if let Some(dir) = sqlite_parent_dir(database_url) {
                tokio::fs::create_dir_all(&dir).await?;
            }
            let store = SqliteStore::connect(database_url).await?;
            info!("Using local store at {}", database_url);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Rest { url, auth_token } => {
            let store = RestStore::new(url, auth_token.clone())?;
            info!("Using remote store at {}", url);
            Ok(Arc::new(store))
        }
    }
}

/// Directory that must exist before `SQLite` can create the file at `url`.
fn sqlite_parent_dir(url: &str) -> Option<String> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    let (dir, _file) = path.rsplit_once('/')?;
    (!dir.is_empty()).then(|| dir.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_local_sqlite() {
        assert_eq!(
            store_backend_from(env(&[])).unwrap(),
            StoreBackend::Sqlite {
                database_url: DEFAULT_DATABASE_URL.to_string()
            }
        );
    }

    #[test]
    fn test_rest_backend() {
        let backend = store_backend_from(env(&[
            ("STORE_BACKEND", "REST"),
            ("STORE_URL", "https://shop.example.com"),
            ("STORE_AUTH_TOKEN", "tok"),
        ]))
        .unwrap();
        assert_eq!(
            backend,
            StoreBackend::Rest {
                url: "https://shop.example.com".into(),
                auth_token: Some("tok".into())
            }
        );
    }

    #[test]
    fn test_rest_without_url_is_config_error() {
        let err = store_backend_from(env(&[("STORE_BACKEND", "rest")])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err = store_backend_from(env(&[("STORE_BACKEND", "mongo")])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/shop_admin.sqlite?mode=rwc"),
            Some("data".to_string())
        );
        assert_eq!(sqlite_parent_dir("sqlite://shop.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
    }

    #[tokio::test]
    async fn test_connect_memory_store() -> Result<()> {
        let store = connect_store(&StoreBackend::Memory).await?;
        assert_eq!(store.get("products").await?, None);
        Ok(())
    }
}
