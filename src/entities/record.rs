//! Record entity - One row per stored record in the local `SQLite` store.
//!
//! The store is hierarchical, but only two levels carry meaning: the collection
//! and the record key. Everything below the key lives in the JSON body.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored record model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Collection the record belongs to (e.g. "products")
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    /// Key of the record within its collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub record_key: String,
    /// The record itself
    pub body: Json,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

/// Records have no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
