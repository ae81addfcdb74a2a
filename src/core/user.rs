//! User business logic - the active/banned toggle.

use crate::core::repository::Repository;
use crate::errors::Result;
use crate::models::{Fields, User, UserStatus};
use serde_json::Value;
use tracing::{info, instrument};

/// Flips a user between active and banned and returns the new status.
///
/// Only the `status` field is written.
///
/// # Errors
/// Returns [`crate::errors::Error::NotFound`] if the user does not exist, or a
/// service error if the read or write fails.
#[instrument(skip(repo))]
pub async fn toggle_status(repo: &Repository<User>, id: &str) -> Result<UserStatus> {
    let user = repo.get(id).await?;
    let status = user.status.toggled();

    let mut patch = Fields::new();
    patch.insert("status".to_string(), Value::from(status.as_str()));
    repo.update(id, patch).await?;

    info!(%id, from = %user.status, to = %status, "user status toggled");
    Ok(status)
}
