//! Key-value storage
//!
//! The ledger and settings services only see string keys and string values.
//! `Repository` provides the SQLite-backed implementation, `MemoryStore` an
//! ephemeral one.

pub mod memory;

pub use memory::MemoryStore;

use crate::database::Repository;
use crate::error::{AppError, Result};
use async_trait::async_trait;

/// String key-value storage shared by the services
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value if present
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl KeyValueStore for Repository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key)
            .await
            .map_err(|e| AppError::StorageRead(format!("{}: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
            .await
            .map_err(|e| AppError::StorageWrite(format!("{}: {}", key, e)))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_value(key)
            .await
            .map_err(|e| AppError::StorageWrite(format!("{}: {}", key, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_repository_as_store() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();

        let store: Arc<dyn KeyValueStore> = Arc::new(Repository::new(pool));

        store.set("beberagua:userName", "Ana").await.unwrap();
        assert_eq!(
            store.get("beberagua:userName").await.unwrap(),
            Some("Ana".to_string())
        );

        store.remove("beberagua:userName").await.unwrap();
        assert_eq!(store.get("beberagua:userName").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_pool_maps_to_storage_errors() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        pool.close().await;

        let repo = Repository::new(pool);

        assert!(matches!(
            KeyValueStore::get(&repo, "waterHistory").await,
            Err(AppError::StorageRead(_))
        ));
        assert!(matches!(
            KeyValueStore::set(&repo, "waterHistory", "[]").await,
            Err(AppError::StorageWrite(_))
        ));
    }
}
