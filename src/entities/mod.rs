//! Entity module - Contains the `SeaORM` entity definitions for the local store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod record;

pub use record::{Column as RecordColumn, Entity as Record, Model as RecordModel};
