//! Hierarchical record store back-ends.
//!
//! Every back-end speaks the same small vocabulary over slash-separated paths:
//! full writes, merge-patch writes, deletes, point reads, and a per-collection
//! change feed. Records are plain JSON values; no schema is enforced here.

/// Broadcast change feeds for stores that see their own writes
pub(crate) mod feed;
/// In-process JSON tree, used for tests and throwaway sessions
pub mod memory;
/// Time-ordered record key generation
pub mod push_id;
/// Realtime-database REST protocol over HTTPS
pub mod rest;
/// Durable local store backed by `SQLite` through `SeaORM`
pub mod sqlite;
/// JSON tree edits shared by the local stores
pub(crate) mod tree;

pub use memory::MemoryStore;
pub use push_id::PushIdGenerator;
pub use rest::RestStore;
pub use sqlite::SqliteStore;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use futures::stream::Stream;
use serde_json::{Map, Value};
use std::pin::Pin;

/// A stream of "this collection changed" ticks.
///
/// Each item signals that the watched collection may have changed; consumers
/// re-read the collection to obtain the new snapshot. An `Err` item ends the feed.
pub type ChangeFeed = Pin<Box<dyn Stream<Item = Result<()>> + Send>>;

/// Characters the store reserves and which therefore cannot appear in a key.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Operations the repository layer needs from a remote store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Replaces the value at `path`. Writing `null` deletes it.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Merges `patch` into the object at `path`, touching only the supplied
    /// children. A `null` child deletes that child.
    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<()>;

    /// Deletes whatever is stored at `path`.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Reads the value at `path`, or `None` if nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Opens a change feed for a top-level collection.
    async fn watch(&self, collection: &str) -> Result<ChangeFeed>;

    /// Generates a fresh key for a new child record.
    fn push_key(&self) -> String;
}

/// Joins a collection and key into a record path.
#[must_use]
pub fn record_path(collection: &str, key: &str) -> String {
    format!("{collection}/{key}")
}

/// Splits a path into its non-empty segments.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Checks that `key` can address exactly one record.
///
/// # Errors
/// Returns [`Error::Validation`] on `id` if the key is blank or contains a
/// reserved character.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("id", "a record id is required"));
    }
    if key.contains(FORBIDDEN_KEY_CHARS) {
        return Err(Error::validation(
            "id",
            format!("'{key}' contains a reserved character (/ . # $ [ ])"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("-Nabc123").is_ok());
        assert!(validate_key("").unwrap_err().is_validation());
        assert!(validate_key("   ").unwrap_err().is_validation());
        assert!(validate_key("a/b").unwrap_err().is_validation());
        assert!(validate_key("a.b").unwrap_err().is_validation());
        assert!(validate_key("$x").unwrap_err().is_validation());
    }

    #[test]
    fn test_segments_ignore_empty_parts() {
        assert_eq!(segments("/products//abc/"), vec!["products", "abc"]);
        assert!(segments("").is_empty());
        assert_eq!(record_path("users", "u1"), "users/u1");
    }
}
