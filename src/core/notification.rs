//! Notification business logic - broadcasting messages and listing them newest first.

use crate::core::ordering::sort_desc_by_key;
use crate::core::repository::Repository;
use crate::errors::Result;
use crate::models::{Fields, Notification, Record};
use serde_json::Value;
use tracing::instrument;

/// Creates a notification and returns its key.
///
/// Title and body are trimmed; the repository stamps `createdAt`.
///
/// # Errors
/// Returns [`crate::errors::Error::Validation`] if title or body is blank, or a
/// service error if the write fails.
#[instrument(skip(repo, body))]
pub async fn send(repo: &Repository<Notification>, title: &str, body: &str) -> Result<String> {
    let mut fields = Fields::new();
    fields.insert("title".to_string(), Value::from(title.trim()));
    fields.insert("body".to_string(), Value::from(body.trim()));
    repo.create(fields).await
}

/// Lists every notification, newest first; undated ones come last.
///
/// # Errors
/// Returns a service error if the read fails.
pub async fn list_newest_first(repo: &Repository<Notification>) -> Result<Vec<Record<Notification>>> {
    let mut notifications = repo.list().await?;
    sort_newest_first(&mut notifications);
    Ok(notifications)
}

/// Sorts notifications by `createdAt` descending, missing timestamps last.
pub fn sort_newest_first(notifications: &mut [Record<Notification>]) {
    sort_desc_by_key(notifications, |record| record.created_at);
}
