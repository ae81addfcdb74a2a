//! User model - a shopper account, with a two-state ban flag.

use crate::errors::{Error, Result};
use crate::models::{Entity, EntitySchema};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a user may use the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal account; also what a record without a status reads as
    #[default]
    Active,
    /// Locked out by an administrator
    Banned,
}

impl UserStatus {
    /// The only transition: active becomes banned and banned becomes active.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Banned,
            Self::Banned => Self::Active,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shopper account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Phone number as typed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Delivery address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Public avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Ban flag
    #[serde(default)]
    pub status: UserStatus,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const SCHEMA: EntitySchema = EntitySchema::new(
        &["name", "email", "phone", "address", "avatar", "status"],
        &["name", "email"],
    )
    .with_image("avatar");

    fn validate(&self) -> Result<()> {
        if !self.email.contains('@') {
            return Err(Error::validation(
                "email",
                format!("'{}' is not an email address", self.email),
            ));
        }
        Ok(())
    }
}
