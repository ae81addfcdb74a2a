//! Generic entity repository - validate, upload, write.
//!
//! One [`Repository`] per collection replaces hand-written per-entity service
//! functions. Every write follows the same pipeline:
//!
//! 1. reject bad input (required fields, immutable fields, read-only collections)
//!    before touching the network
//! 2. type-check the resulting record against the entity model
//! 3. upload the image field if it holds a local reference
//! 4. perform exactly one store write
//!
//! A failure at any step leaves the store untouched.

use crate::core::subscription::Subscription;
use crate::errors::{Error, Result};
use crate::models::{Entity, Fields, Record, fields_of, is_blank};
use crate::store::{RecordStore, record_path, validate_key};
use crate::uploader::{ImagePolicy, ImageSource, ImageUploader};
use futures::StreamExt;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Typed access to one collection of the record store.
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    uploader: Arc<dyn ImageUploader>,
    images: Arc<ImagePolicy>,
    collection: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            uploader: Arc::clone(&self.uploader),
            images: Arc::clone(&self.images),
            collection: self.collection.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> Repository<T> {
    /// Creates a repository for `T`'s collection.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        uploader: Arc<dyn ImageUploader>,
        images: Arc<ImagePolicy>,
    ) -> Self {
        Self {
            store,
            uploader,
            images,
            collection: T::COLLECTION.to_string(),
            _entity: PhantomData,
        }
    }

    /// The collection path this repository owns.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Creates a record under a freshly generated key and returns the key.
    ///
    /// `null` values are treated as absent. For stamped collections the creation
    /// time is written in epoch milliseconds, replacing any supplied value.
    ///
    /// # Errors
    /// - [`Error::ReadOnly`] for read-only collections
    /// - [`Error::Validation`] if a required field is blank, a field is unknown or
    ///   the record does not match the model (nothing is uploaded or written)
    /// - [`Error::Upload`] if the image upload fails (nothing is written)
    /// - a service error if the store write fails
    #[instrument(skip(self, input), fields(collection = %self.collection))]
    pub async fn create(&self, mut input: Fields) -> Result<String> {
        self.ensure_writable()?;
        input.retain(|_, value| !value.is_null());

        for &field in T::SCHEMA.required {
            if is_blank(input.get(field)) {
                return Err(Error::validation(field, "is required"));
            }
        }
        if let Some(stamp) = T::SCHEMA.created_at_field {
            input.insert(
                stamp.to_string(),
                Value::from(chrono::Utc::now().timestamp_millis()),
            );
        }

        if let Some(field) = input.keys().find(|field| !T::SCHEMA.has_field(field)) {
            return Err(self.unknown_field(field));
        }
        let mut record = self.canonicalize(input)?;

        self.resolve_image(&mut record).await?;

        let id = self.store.push_key();
        self.store
            .set(&record_path(&self.collection, &id), Value::Object(record))
            .await?;
        info!(%id, "record created");
        Ok(id)
    }

    /// Merges `patch` into the record at `id`, changing only the supplied fields.
    ///
    /// A `null` value deletes that field. An empty patch does nothing.
    ///
    /// # Errors
    /// - [`Error::Validation`] if `id` is malformed, a required field is blanked,
    ///   an immutable or unknown field is supplied, or the merged record does not
    ///   match the model
    /// - [`Error::ReadOnly`] for read-only collections
    /// - [`Error::NotFound`] if no record exists at `id`
    /// - [`Error::Upload`] or a service error from the upload or the write
    #[instrument(skip(self, patch), fields(collection = %self.collection))]
    pub async fn update(&self, id: &str, patch: Fields) -> Result<()> {
        validate_key(id)?;
        self.ensure_writable()?;
        if patch.is_empty() {
            debug!(%id, "empty patch, nothing to write");
            return Ok(());
        }

        for (field, value) in &patch {
            if !T::SCHEMA.has_field(field) {
                return Err(self.unknown_field(field));
            }
            if T::SCHEMA.is_immutable(field) {
                return Err(Error::validation(field, "cannot be changed after creation"));
            }
            if T::SCHEMA.required.contains(&field.as_str()) && is_blank(Some(value)) {
                return Err(Error::validation(field, "is required"));
            }
        }

        let path = record_path(&self.collection, id);
        let Some(Value::Object(mut merged)) = self.store.get(&path).await? else {
            return Err(Error::not_found(&self.collection, id));
        };
        for (field, value) in &patch {
            if value.is_null() {
                merged.remove(field);
            } else {
                merged.insert(field.clone(), value.clone());
            }
        }
        let canonical = self.canonicalize(merged)?;

        let mut changes = Fields::new();
        for (field, value) in patch {
            if value.is_null() {
                changes.insert(field, Value::Null);
                continue;
            }
            let Some(checked) = canonical.get(&field) else {
                return Err(self.unknown_field(&field));
            };
            changes.insert(field, checked.clone());
        }

        self.resolve_image(&mut changes).await?;
        self.store.update(&path, changes).await?;
        info!(%id, "record updated");
        Ok(())
    }

    /// Deletes the record at `id`. Irreversible.
    ///
    /// # Errors
    /// [`Error::Validation`] on a malformed id, [`Error::ReadOnly`],
    /// [`Error::NotFound`] if the record does not exist, or a service error.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn remove(&self, id: &str) -> Result<()> {
        validate_key(id)?;
        self.ensure_writable()?;

        let path = record_path(&self.collection, id);
        if self.store.get(&path).await?.is_none() {
            return Err(Error::not_found(&self.collection, id));
        }
        self.store.remove(&path).await?;
        info!(%id, "record removed");
        Ok(())
    }

    /// Reads one record.
    ///
    /// # Errors
    /// [`Error::Validation`] on a malformed id, [`Error::NotFound`] if absent,
    /// [`Error::Decode`] if the stored value does not match the model, or a
    /// service error.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get(&self, id: &str) -> Result<Record<T>> {
        validate_key(id)?;
        let value = self
            .store
            .get(&record_path(&self.collection, id))
            .await?
            .ok_or_else(|| Error::not_found(&self.collection, id))?;
        self.decode(id, value)
    }

    /// Reads the whole collection in store key order.
    ///
    /// Records that do not match the model are skipped with a warning.
    ///
    /// # Errors
    /// Returns a service error if the read fails.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn list(&self) -> Result<Vec<Record<T>>> {
        let snapshot = self.store.get(&self.collection).await?;
        Ok(self.decode_collection(snapshot))
    }

    /// Calls `on_change` with the current collection, then again after every
    /// change to it, until the returned [`Subscription`] is dropped.
    ///
    /// Consecutive identical snapshots are delivered once. A failing change
    /// feed ends the subscription.
    ///
    /// # Errors
    /// Returns a service error if the feed cannot be opened or the first read fails.
    pub async fn subscribe<F>(&self, on_change: F) -> Result<Subscription>
    where
        F: Fn(Vec<Record<T>>) + Send + 'static,
    {
        let mut feed = self.store.watch(&self.collection).await?;
        let mut last = self.store.get(&self.collection).await?;
        on_change(self.decode_collection(last.clone()));

        let repository = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(tick) = feed.next().await {
                if let Err(e) = tick {
                    warn!(collection = %repository.collection, "change feed ended: {}", e);
                    break;
                }
                match repository.store.get(&repository.collection).await {
                    Ok(snapshot) if snapshot == last => {}
                    Ok(snapshot) => {
                        on_change(repository.decode_collection(snapshot.clone()));
                        last = snapshot;
                    }
                    Err(e) => {
                        warn!(collection = %repository.collection, "failed to refresh: {}", e);
                    }
                }
            }
            debug!(collection = %repository.collection, "subscription finished");
        });

        Ok(Subscription::new(handle))
    }

    fn ensure_writable(&self) -> Result<()> {
        if T::SCHEMA.read_only {
            return Err(Error::ReadOnly {
                collection: self.collection.clone(),
            });
        }
        Ok(())
    }

    fn unknown_field(&self, field: &str) -> Error {
        Error::validation(field, format!("is not a field of '{}'", self.collection))
    }

    /// Type-checks `record` and returns its canonical field values.
    fn canonicalize(&self, record: Fields) -> Result<Fields> {
        let entity: T = serde_json::from_value(Value::Object(record))
            .map_err(|e| Error::validation("record", e.to_string()))?;
        entity.validate()?;
        let mut canonical = fields_of(&entity)?;
        canonical.retain(|_, value| !value.is_null());
        Ok(canonical)
    }

    /// Uploads a local image reference and swaps in the returned URL.
    async fn resolve_image(&self, fields: &mut Fields) -> Result<()> {
        let Some(field) = T::SCHEMA.image_field else {
            return Ok(());
        };
        let Some(Value::String(value)) = fields.get(field) else {
            return Ok(());
        };
        match self.images.classify(value) {
            ImageSource::Local(image) => {
                let url = self.uploader.upload(&image).await?;
                debug!(field, %url, "image replaced by uploaded URL");
                fields.insert(field.to_string(), Value::String(url));
            }
            ImageSource::Remote(url) => {
                fields.insert(field.to_string(), Value::String(url));
            }
            ImageSource::Empty => {}
        }
        Ok(())
    }

    fn decode(&self, id: &str, value: Value) -> Result<Record<T>> {
        serde_json::from_value(value)
            .map(|data| Record {
                id: id.to_string(),
                data,
            })
            .map_err(|e| Error::Decode {
                collection: self.collection.clone(),
                id: id.to_string(),
                message: e.to_string(),
            })
    }

    fn decode_collection(&self, snapshot: Option<Value>) -> Vec<Record<T>> {
        match snapshot {
            None => Vec::new(),
            Some(Value::Object(children)) => children
                .into_iter()
                .filter_map(|(id, value)| {
                    self.decode(&id, value)
                        .inspect_err(|e| warn!("skipping record: {}", e))
                        .ok()
                })
                .collect(),
            Some(other) => {
                warn!(
                    collection = %self.collection,
                    "collection holds a {} instead of records",
                    type_name(&other)
                );
                Vec::new()
            }
        }
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
