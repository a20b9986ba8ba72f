//! services/api/src/adapters/sqlite.rs
//!
//! This module contains the storage adapter, the concrete implementation of the
//! `SnapshotStorage` port from the core crate. It keeps keyed blobs in a local
//! SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::Utc;
use matcher_core::ports::{PortError, PortResult, SnapshotStorage};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter that implements the `SnapshotStorage` port.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Creates a new `SqliteStorage`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a small pool.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// `SnapshotStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl SnapshotStorage for SqliteStorage {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
