//! Local `SQLite` store for offline administration and development.
//!
//! Records live in a single `records` table keyed by collection and record key,
//! with the record body stored as JSON. Paths one level deep address a whole
//! collection; deeper paths address a record or a field inside its body.
//! Writes made through this store feed its change feeds; writes made by other
//! processes against the same file are not observed.

use crate::entities::{Record, RecordColumn, RecordModel, record};
use crate::errors::{Error, Result};
use crate::store::tree::{is_empty, read_at, remove_at, write_at};
use crate::store::{ChangeFeed, PushIdGenerator, RecordStore, feed::ChangeNotifier, segments};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, QueryOrder, Schema, Set, TransactionTrait,
    prelude::*,
};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

/// A [`RecordStore`] persisted in `SQLite` through `SeaORM`.
#[derive(Debug)]
pub struct SqliteStore {
    db: DatabaseConnection,
    changes: ChangeNotifier,
    keys: PushIdGenerator,
}

impl SqliteStore {
    /// Opens the database at `url` (e.g. `sqlite://data/shop_admin.sqlite?mode=rwc`)
    /// and makes sure the `records` table exists.
    ///
    /// # Errors
    /// Returns [`Error::Database`] if the connection or table creation fails.
    #[instrument]
    pub async fn connect(url: &str) -> Result<Self> {
        debug!("Opening local store at {}", url);
        let db = Database::connect(url).await?;
        Self::from_connection(db).await
    }

    /// Wraps an existing connection, creating the `records` table if needed.
    ///
    /// # Errors
    /// Returns [`Error::Database`] if table creation fails.
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        create_tables(&db).await?;
        info!("Local store ready");
        Ok(Self {
            db,
            changes: ChangeNotifier::default(),
            keys: PushIdGenerator::new(),
        })
    }
}

/// Creates the `records` table from the entity definition if it does not exist yet.
///
/// # Errors
/// Returns [`Error::Database`] if the statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut records_table = schema.create_table_from_entity(Record);
    records_table.if_not_exists();
    db.execute(builder.build(&records_table)).await?;

    Ok(())
}

/// A path split into collection, optional record key, and the path inside the body.
struct Address<'a> {
    collection: &'a str,
    key: Option<&'a str>,
    inner: Vec<&'a str>,
}

impl<'a> Address<'a> {
    fn parse(path: &'a str) -> Result<Self> {
        let parts = segments(path);
        let Some((collection, rest)) = parts.split_first() else {
            return Err(Error::service(
                "the local store cannot address the root; name a collection",
            ));
        };
        Ok(match rest.split_first() {
            None => Self {
                collection: *collection,
                key: None,
                inner: Vec::new(),
            },
            Some((key, inner)) => Self {
                collection: *collection,
                key: Some(*key),
                inner: inner.to_vec(),
            },
        })
    }
}

async fn load_body<C: ConnectionTrait>(db: &C, collection: &str, key: &str) -> Result<Value> {
    Ok(Record::find_by_id((collection.to_string(), key.to_string()))
        .one(db)
        .await?
        .map_or(Value::Null, |row| row.body))
}

/// Writes `body` as the record at `collection/key`, deleting the row when empty.
async fn save_body<C: ConnectionTrait>(
    db: &C,
    collection: &str,
    key: &str,
    body: Value,
) -> Result<()> {
    if is_empty(&body) {
        Record::delete_by_id((collection.to_string(), key.to_string()))
            .exec(db)
            .await?;
        return Ok(());
    }

    let row = record::ActiveModel {
        collection: Set(collection.to_string()),
        record_key: Set(key.to_string()),
        body: Set(body),
        updated_at: Set(chrono::Utc::now()),
    };
    Record::insert(row)
        .on_conflict(
            OnConflict::columns([RecordColumn::Collection, RecordColumn::RecordKey])
                .update_columns([RecordColumn::Body, RecordColumn::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn clear_collection<C: ConnectionTrait>(db: &C, collection: &str) -> Result<()> {
    Record::delete_many()
        .filter(RecordColumn::Collection.eq(collection))
        .exec(db)
        .await?;
    Ok(())
}

/// Applies one write at `address`, the shared core of `set`, `update` and `remove`.
async fn write<C: ConnectionTrait>(db: &C, address: &Address<'_>, value: Value) -> Result<()> {
    match address.key {
        None => {
            clear_collection(db, address.collection).await?;
            match value {
                Value::Object(children) => {
                    for (key, body) in children {
                        save_body(db, address.collection, &key, body).await?;
                    }
                    Ok(())
                }
                Value::Null => Ok(()),
                _ => Err(Error::service(format!(
                    "collection '{}' can only hold records",
                    address.collection
                ))),
            }
        }
        Some(key) => {
            let mut body = load_body(db, address.collection, key).await?;
            write_at(&mut body, &address.inner, value);
            save_body(db, address.collection, key, body).await
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    #[instrument(skip(self, value))]
    async fn set(&self, path: &str, value: Value) -> Result<()> {
        let address = Address::parse(path)?;
        let txn = self.db.begin().await?;
        write(&txn, &address, value).await?;
        txn.commit().await?;
        self.changes.notify(path);
        Ok(())
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, path: &str, patch: Map<String, Value>) -> Result<()> {
        let txn = self.db.begin().await?;
        for (child, value) in patch {
            let child_path = format!("{path}/{child}");
            let address = Address::parse(&child_path)?;
            write(&txn, &address, value).await?;
        }
        txn.commit().await?;
        self.changes.notify(path);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<()> {
        let address = Address::parse(path)?;
        match address.key {
            None => clear_collection(&self.db, address.collection).await?,
            Some(key) if address.inner.is_empty() => {
                save_body(&self.db, address.collection, key, Value::Null).await?;
            }
            Some(key) => {
                let txn = self.db.begin().await?;
                let mut body = load_body(&txn, address.collection, key).await?;
                remove_at(&mut body, &address.inner);
                save_body(&txn, address.collection, key, body).await?;
                txn.commit().await?;
            }
        }
        self.changes.notify(path);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let address = Address::parse(path)?;
        let Some(key) = address.key else {
            let rows: Vec<RecordModel> = Record::find()
                .filter(RecordColumn::Collection.eq(address.collection))
                .order_by_asc(RecordColumn::RecordKey)
                .all(&self.db)
                .await?;
            if rows.is_empty() {
                return Ok(None);
            }
            let collection: Map<String, Value> = rows
                .into_iter()
                .map(|row| (row.record_key, row.body))
                .collect();
            return Ok(Some(Value::Object(collection)));
        };

        let body = load_body(&self.db, address.collection, key).await?;
        Ok(read_at(&body, &address.inner)
            .filter(|node| !is_empty(node))
            .cloned())
    }

    async fn watch(&self, collection: &str) -> Result<ChangeFeed> {
        Ok(self.changes.feed(collection))
    }

    fn push_key(&self) -> String {
        self.keys.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    async fn setup_store() -> Result<SqliteStore> {
        SqliteStore::connect("sqlite::memory:").await
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_record_round_trip() -> Result<()> {
        let store = setup_store().await?;
        store
            .set("categories/c1", json!({"title": "Pens", "image": "https://cdn/p.jpg"}))
            .await?;

        assert_eq!(
            store.get("categories/c1").await?,
            Some(json!({"title": "Pens", "image": "https://cdn/p.jpg"}))
        );
        assert_eq!(store.get("categories/c1/title").await?, Some(json!("Pens")));
        assert_eq!(store.get("categories/c2").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_row() -> Result<()> {
        let store = setup_store().await?;
        store.set("brands/b1", json!({"title": "Old", "image": "x"})).await?;
        store.set("brands/b1", json!({"title": "New"})).await?;
        assert_eq!(store.get("brands/b1").await?, Some(json!({"title": "New"})));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_merges_into_body() -> Result<()> {
        let store = setup_store().await?;
        store
            .set("users/u1", json!({"name": "Lan", "status": "active"}))
            .await?;

        let mut patch = Map::new();
        patch.insert("status".into(), json!("banned"));
        store.update("users/u1", patch).await?;

        assert_eq!(
            store.get("users/u1").await?,
            Some(json!({"name": "Lan", "status": "banned"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_collection_reads_and_removes() -> Result<()> {
        let store = setup_store().await?;
        store.set("notifications/a", json!({"title": "A"})).await?;
        store.set("notifications/b", json!({"title": "B"})).await?;

        assert_eq!(
            store.get("notifications").await?,
            Some(json!({"a": {"title": "A"}, "b": {"title": "B"}}))
        );

        store.remove("notifications/a").await?;
        assert_eq!(
            store.get("notifications").await?,
            Some(json!({"b": {"title": "B"}}))
        );

        store.remove("notifications").await?;
        assert_eq!(store.get("notifications").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_root_path_is_rejected() -> Result<()> {
        let store = setup_store().await?;
        let result = store.get("").await;
        assert!(matches!(result, Err(Error::Service { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_watch_sees_local_writes() -> Result<()> {
        let store = setup_store().await?;
        let mut feed = store.watch("banners").await?;
        store.set("banners/x", json!({"title": "Sale"})).await?;

        let tick = tokio::time::timeout(Duration::from_secs(1), feed.next()).await;
        assert!(matches!(tick, Ok(Some(Ok(())))));
        Ok(())
    }
}
