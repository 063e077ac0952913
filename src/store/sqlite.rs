//! SQLite-backed durable store.
//!
//! The snapshot lives in a small key-value table, one row per namespace:
//!
//! ```sql
//! geo_store(namespace TEXT PRIMARY KEY, payload TEXT NOT NULL, updated_at INTEGER NOT NULL)
//! ```

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use log::{error, info};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};

use super::DurableStore;
use crate::error_handling::StoreError;

/// Durable store keeping the snapshot in one SQLite row per namespace.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    namespace: String,
    location: String,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_path`.
    ///
    /// Creates the database file if it doesn't exist, enables WAL mode and
    /// ensures the table exists.
    pub async fn open(db_path: &Path, namespace: &str) -> Result<Self, StoreError> {
        let db_path_str = db_path.to_string_lossy().to_string();
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&db_path_str)
        {
            Ok(_) => info!("Geo cache database created at {}", db_path_str),
            Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Geo cache database already exists at {}", db_path_str)
            }
            Err(e) => {
                error!("Failed to create database file: {e}");
                return Err(StoreError::Io(e));
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path_str))
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {e}");
                StoreError::Sql(e)
            })?;

        // Enable WAL mode
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await
            .map_err(|e| {
                error!("Failed to set WAL mode: {e}");
                StoreError::Sql(e)
            })?;

        Self::from_pool(pool, namespace, db_path_str).await
    }

    /// Opens a private in-memory database.
    ///
    /// Limited to one connection: every `sqlite::memory:` connection is a
    /// separate database.
    pub async fn in_memory(namespace: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool, namespace, ":memory:".to_string()).await
    }

    async fn from_pool(
        pool: Pool<Sqlite>,
        namespace: &str,
        location: String,
    ) -> Result<Self, StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS geo_store (
                namespace TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            namespace: namespace.to_string(),
            location,
        })
    }

    /// The underlying pool, for callers that need direct access (tests, tooling).
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn read_blob(&self) -> Result<Option<String>, StoreError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM geo_store WHERE namespace = ?")
                .bind(&self.namespace)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO geo_store (namespace, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(namespace) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
        )
        .bind(&self.namespace)
        .bind(blob)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Error when writing geo cache snapshot: {}", e);
            StoreError::Sql(e)
        })?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{} ({})", self.location, self.namespace)
    }
}
