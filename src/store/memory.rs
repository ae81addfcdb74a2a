//! In-process store holding the whole tree as one JSON value.
//!
//! Semantics follow the remote store: writing `null` or an empty object deletes,
//! containers left empty by a delete disappear, and reads of missing paths
//! return `None`.

use crate::errors::Result;
use crate::store::tree::{is_empty, read_at, remove_at, write_at};
use crate::store::{ChangeFeed, PushIdGenerator, RecordStore, feed::ChangeNotifier, segments};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// A [`RecordStore`] that lives entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    root: RwLock<Value>,
    changes: ChangeNotifier,
    keys: PushIdGenerator,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            changes: ChangeNotifier::default(),
            keys: PushIdGenerator::new(),
        }
    }

    /// Creates a store pre-populated with `tree`. Non-object trees are ignored.
    #[must_use]
    pub fn with_data(tree: Value) -> Self {
        let root = if tree.is_object() {
            tree
        } else {
            Value::Object(Map::new())
        };
        Self {
            root: RwLock::new(root),
            changes: ChangeNotifier::default(),
            keys: PushIdGenerator::new(),
        }
    }

    /// Returns a copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    #[instrument(skip(self, value))]
    async fn set(&self, path: &str, value: Value) -> Result<()> {
        {
            let mut root = self.root.write().await;
            write_at(&mut root, &segments(path), value);
        }
        self.changes.notify(path);
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<()> {
        {
            let mut root = self.root.write().await;
            let base = segments(path);
            for (child, value) in patch {
                let mut target = base.clone();
                target.extend(segments(&child));
                write_at(&mut root, &target, value);
            }
        }
        self.changes.notify(path);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<()> {
        {
            let mut root = self.root.write().await;
            remove_at(&mut root, &segments(path));
        }
        self.changes.notify(path);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let root = self.root.read().await;
        Ok(read_at(&root, &segments(path))
            .filter(|node| !is_empty(node))
            .cloned())
    }

    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        debug!(collection, "opening in-memory change feed");
        Ok(self.changes.feed(collection))
    }

    fn push_key(&self) -> String {
        self.keys.next_id()
    }
}
