//! Unified error type for the admin back-end.
//!
//! Errors fall into three families the presentation layer cares about:
//! validation failures (caught before any network call), missing records, and
//! service failures from the remote store or the image service. The remaining
//! variants carry the underlying transport error so it can be logged.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or empty, or a value has the wrong shape.
    #[error("Invalid `{field}`: {message}")]
    Validation {
        /// Name of the offending field (`id` for key problems)
        field: String,
        /// Human-readable explanation
        message: String,
    },

    /// Point read or mutation on a key that does not exist.
    #[error("Record '{id}' not found in '{collection}'")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Key that was requested
        id: String,
    },

    /// Mutation attempted on a collection this back-end only reads.
    #[error("Collection '{collection}' is read-only")]
    ReadOnly {
        /// The read-only collection
        collection: String,
    },

    /// The remote store rejected a request or returned something unusable.
    #[error("Remote store error: {message}")]
    Service {
        /// Description of the failure
        message: String,
    },

    /// The image service failed to produce a public URL.
    #[error("Image upload failed: {message}")]
    Upload {
        /// Description of the failure
        message: String,
    },

    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// A stored record does not match its entity model.
    #[error("Malformed record '{id}' in '{collection}': {message}")]
    Decode {
        /// Collection of the record
        collection: String,
        /// Key of the record
        id: String,
        /// Deserializer message
        message: String,
    },

    /// Local database failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Network failure talking to an HTTP service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Shorthand for a [`Error::Service`].
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Upload`].
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    /// True for input problems a caller should report next to a form field.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::ReadOnly { .. })
    }

    /// True for failures of the remote store or the image service.
    #[must_use]
    pub const fn is_service(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::Upload { .. } | Self::Database(_) | Self::Http(_)
        )
    }

    /// True when the requested record does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short message suitable for a confirmation dialog.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("Please check '{field}': {message}"),
            Self::NotFound { .. } => "That item no longer exists.".to_string(),
            Self::ReadOnly { collection } => format!("'{collection}' cannot be changed here."),
            Self::Upload { .. } => "Could not upload the image. Please try again.".to_string(),
            Self::Service { .. } | Self::Database(_) | Self::Http(_) => {
                "The server could not complete the request. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
