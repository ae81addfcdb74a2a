//! Domain models - the typed shape of each collection's records.
//!
//! The store itself is schemaless. Each model declares its collection and an
//! [`EntitySchema`] (required fields, image field, creation stamp, read-only
//! flag) that the generic repository enforces on every write.

pub mod banner;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod product;
pub mod user;

pub use banner::Banner;
pub use catalog::{Brand, Category};
pub use notification::Notification;
pub use order::{Order, OrderItem};
pub use product::Product;
pub use user::{User, UserStatus};

use crate::errors::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::ops::Deref;

/// Field values for a create or a merge-patch, keyed by wire name.
pub type Fields = Map<String, Value>;

/// Write rules for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Every field the model knows, by wire name
    pub fields: &'static [&'static str],
    /// Fields that must be present and non-empty
    pub required: &'static [&'static str],
    /// Field holding an image URL, uploaded first when it holds a local reference
    pub image_field: Option<&'static str>,
    /// Field stamped with the creation time in epoch milliseconds
    pub created_at_field: Option<&'static str>,
    /// Fields that cannot be changed after creation
    pub immutable: &'static [&'static str],
    /// Whether this back-end may only read the collection
    pub read_only: bool,
}

impl EntitySchema {
    /// A writable schema over `fields`, of which `required` must be non-empty.
    #[must_use]
    pub const fn new(
        fields: &'static [&'static str],
        required: &'static [&'static str],
    ) -> Self {
        Self {
            fields,
            required,
            image_field: None,
            created_at_field: None,
            immutable: &[],
            read_only: false,
        }
    }

    /// Marks `field` as the image field.
    #[must_use]
    pub const fn with_image(mut self, field: &'static str) -> Self {
        self.image_field = Some(field);
        self
    }

    /// Stamps `field` with the creation time; the stamp is immutable.
    #[must_use]
    pub const fn stamped(mut self, field: &'static str) -> Self {
        self.created_at_field = Some(field);
        self
    }

    /// Forbids changes to `fields` after creation.
    #[must_use]
    pub const fn with_immutable(mut self, fields: &'static [&'static str]) -> Self {
        self.immutable = fields;
        self
    }

    /// Makes the collection read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// True when `field` belongs to the model.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// True when an update may not touch `field`.
    #[must_use]
    pub fn is_immutable(&self, field: &str) -> bool {
        self.created_at_field == Some(field) || self.immutable.contains(&field)
    }
}

/// A record type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path the records live under
    const COLLECTION: &'static str;
    /// Write rules for the collection
    const SCHEMA: EntitySchema;

    /// Checks rules serde cannot express (ranges, formats).
    ///
    /// # Errors
    /// Returns [`Error::Validation`] naming the offending field.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// A decoded record together with its store key.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    /// Store key
    pub id: String,
    /// Decoded fields
    pub data: T,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

/// Serialized flat, with the key as an `id` field, the way list screens expect it.
impl<T: Serialize> Serialize for Record<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.data).map_err(serde::ser::Error::custom)?;
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        value.serialize(serializer)
    }
}

/// Converts a typed value into field values.
///
/// # Errors
/// Returns [`Error::Validation`] if `value` does not serialize to a JSON object.
pub fn fields_of<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation("record", "must be an object of fields")),
    }
}

/// True when a field value counts as missing for required-field checks.
#[must_use]
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Deserializers that accept numbers typed into text fields.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn parse<E: serde::de::Error>(value: NumberOrText) -> Result<f64, E> {
        match value {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("'{text}' is not a number"))),
        }
    }

    /// A number, or a string holding one.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse(NumberOrText::deserialize(deserializer)?)
    }

    /// Like [`number`], for optional fields.
    pub fn optional_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<NumberOrText>::deserialize(deserializer)?
            .map(parse::<D::Error>)
            .transpose()
    }
}
