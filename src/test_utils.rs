//! Shared test utilities for `shop-admin`.
//!
//! Fakes for the two external services plus setup helpers that wire them into
//! repositories with sensible defaults.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use crate::core::{AdminData, Repository};
use crate::errors::{Error, Result};
use crate::models::{Entity, Fields};
use crate::store::{ChangeFeed, MemoryStore, RecordStore};
use crate::uploader::{ImagePolicy, ImageUploader, LocalImage};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Converts a `json!({...})` literal into field values.
///
/// # Panics
/// Panics if `value` is not an object.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Uploader that records every call and answers from a queue of URLs.
#[derive(Debug, Default)]
pub struct MockUploader {
    urls: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<String>>,
    failing: bool,
}

impl MockUploader {
    /// Succeeds with `https://cdn/upload-{n}.jpg` unless URLs are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeeds with `url` for the first upload.
    pub fn returning(url: &str) -> Self {
        let uploader = Self::default();
        uploader.urls.lock().unwrap().push_back(url.to_string());
        uploader
    }

    /// Fails every upload.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Queues the URL returned by the next upload.
    pub fn push_url(&self, url: &str) {
        self.urls.lock().unwrap().push_back(url.to_string());
    }

    /// References passed to `upload`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageUploader for MockUploader {
    async fn upload(&self, image: &LocalImage) -> Result<String> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(image.reference().to_string());
            calls.len()
        };
        if self.failing {
            return Err(Error::upload("mock upload failure"));
        }
        let queued = self.urls.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| format!("https://cdn/upload-{call_number}.jpg")))
    }
}

/// [`MemoryStore`] that counts write calls.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    failing_feed: bool,
}

impl CountingStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `tree`.
    pub fn with_data(tree: Value) -> Self {
        Self {
            inner: MemoryStore::with_data(tree),
            ..Self::default()
        }
    }

    /// Empty store whose change feeds fail on their first item.
    pub fn with_failing_feed() -> Self {
        Self {
            failing_feed: true,
            ..Self::default()
        }
    }

    /// Number of `set`, `update` and `remove` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The whole tree.
    pub async fn snapshot(&self) -> Value {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(path, value).await
    }

    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(path, patch).await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(path).await
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.inner.get(path).await
    }

    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        if self.failing_feed {
            let failure: Result<()> = Err(Error::service("listener cancelled"));
            return Ok(Box::pin(futures::stream::iter(vec![failure])));
        }
        self.inner.watch(collection).await
    }

    fn push_key(&self) -> String {
        self.inner.push_key()
    }
}

/// A repository over `store` and `uploader` with the default image policy.
pub fn repository_with<T: Entity>(
    store: &Arc<CountingStore>,
    uploader: &Arc<MockUploader>,
) -> Repository<T> {
    Repository::new(
        Arc::clone(store) as Arc<dyn RecordStore>,
        Arc::clone(uploader) as Arc<dyn ImageUploader>,
        Arc::new(ImagePolicy::default()),
    )
}

/// A repository over a fresh counting store and mock uploader.
pub fn setup_repository<T: Entity>() -> (Repository<T>, Arc<CountingStore>, Arc<MockUploader>) {
    let store = Arc::new(CountingStore::new());
    let uploader = Arc::new(MockUploader::new());
    (repository_with(&store, &uploader), store, uploader)
}

/// Every repository over a fresh counting store and mock uploader.
pub fn setup_admin_data() -> (AdminData, Arc<CountingStore>, Arc<MockUploader>) {
    let store = Arc::new(CountingStore::new());
    let uploader = Arc::new(MockUploader::new());
    let data = AdminData::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::clone(&uploader) as Arc<dyn ImageUploader>,
        ImagePolicy::default(),
    );
    (data, store, uploader)
}
