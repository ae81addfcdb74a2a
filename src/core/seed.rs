//! Seeding categories listed in `config.toml`.

use crate::config::settings::CategorySeed;
use crate::core::repository::Repository;
use crate::errors::Result;
use crate::models::{Category, Fields};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Creates every configured category whose title is not taken yet.
///
/// Titles are compared case-insensitively. Returns the number created.
///
/// # Errors
/// Returns the first validation, upload or service error; categories created
/// before the failure stay in place.
#[instrument(skip_all, fields(seeds = seeds.len()))]
pub async fn seed_categories(repo: &Repository<Category>, seeds: &[CategorySeed]) -> Result<usize> {
    let mut existing: HashSet<String> = repo
        .list()
        .await?
        .into_iter()
        .map(|record| record.title.trim().to_lowercase())
        .collect();

    let mut created = 0;
    for seed in seeds {
        let key = seed.title.trim().to_lowercase();
        if existing.contains(&key) {
            debug!(title = %seed.title, "category already exists");
            continue;
        }

        let mut fields = Fields::new();
        fields.insert("title".to_string(), Value::from(seed.title.trim()));
        fields.insert("image".to_string(), Value::from(seed.image.trim()));
        repo.create(fields).await?;

        existing.insert(key);
        created += 1;
    }

    info!(created, "category seeding complete");
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_repository;

    fn seeds() -> Vec<CategorySeed> {
        vec![
            CategorySeed {
                title: "Stationery".into(),
                image: "https://cdn/stationery.jpg".into(),
            },
            CategorySeed {
                title: "Books".into(),
                image: "file://seed/books.jpg".into(),
            },
        ]
    }

    #[tokio::test]
    async fn test_seed_creates_missing_categories_once() -> Result<()> {
        let (repo, _store, uploader) = setup_repository::<Category>();

        assert_eq!(seed_categories(&repo, &seeds()).await?, 2);
        assert_eq!(uploader.calls(), vec!["file://seed/books.jpg"]);

        assert_eq!(seed_categories(&repo, &seeds()).await?, 0);
        assert_eq!(repo.list().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_matches_titles_case_insensitively() -> Result<()> {
        let (repo, _store, _uploader) = setup_repository::<Category>();
        let mut existing = Fields::new();
        existing.insert("title".into(), Value::from("stationery"));
        existing.insert("image".into(), Value::from("https://cdn/s.jpg"));
        repo.create(existing).await?;

        assert_eq!(seed_categories(&repo, &seeds()).await?, 1);
        Ok(())
    }
}
