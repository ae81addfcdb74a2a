//! Core business logic - store-agnostic data access for every admin screen.

/// Notification sending and newest-first listing
pub mod notification;
/// Client-side sort helpers
pub mod ordering;
/// The generic validate-upload-write repository
pub mod repository;
/// Seeding catalog records from configuration
pub mod seed;
/// Live listener handles
pub mod subscription;
/// User status toggle
pub mod user;

pub use repository::Repository;
pub use subscription::Subscription;

use crate::models::{Banner, Brand, Category, Notification, Order, Product, User};
use crate::store::RecordStore;
use crate::uploader::{ImagePolicy, ImageUploader};
use std::sync::Arc;

/// One repository per collection, all sharing the same store and uploader.
#[derive(Debug, Clone)]
pub struct AdminData {
    /// `products`
    pub products: Repository<Product>,
    /// `categories`
    pub categories: Repository<Category>,
    /// `brands`
    pub brands: Repository<Brand>,
    /// `users`
    pub users: Repository<User>,
    /// `orders` (read-only)
    pub orders: Repository<Order>,
    /// `notifications`
    pub notifications: Repository<Notification>,
    /// `banners`
    pub banners: Repository<Banner>,
}

impl AdminData {
    /// Wires every repository to `store` and `uploader`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        uploader: Arc<dyn ImageUploader>,
        images: ImagePolicy,
    ) -> Self {
        let images = Arc::new(images);
        Self {
            products: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            categories: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            brands: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            users: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            orders: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            notifications: Repository::new(Arc::clone(&store), Arc::clone(&uploader), Arc::clone(&images)),
            banners: Repository::new(store, uploader, images),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::test_utils::{fields, setup_admin_data};
    use serde_json::json;

    #[tokio::test]
    async fn test_repositories_own_their_collections() -> Result<()> {
        let (data, store, _uploader) = setup_admin_data();
        assert_eq!(data.products.collection(), "products");
        assert_eq!(data.categories.collection(), "categories");
        assert_eq!(data.brands.collection(), "brands");
        assert_eq!(data.users.collection(), "users");
        assert_eq!(data.orders.collection(), "orders");
        assert_eq!(data.notifications.collection(), "notifications");
        assert_eq!(data.banners.collection(), "banners");

        let id = data
            .brands
            .create(fields(json!({"title": "Acme", "image": "https://cdn/acme.png"})))
            .await?;
        assert!(store.snapshot().await["brands"].get(&id).is_some());
        assert!(data.categories.list().await?.is_empty());
        Ok(())
    }
}
