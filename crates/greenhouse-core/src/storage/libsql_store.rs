//! libSQL-backed key-value store

use std::path::Path;
use std::sync::Arc;

use crate::db::Database;
use crate::error::Result;

use super::KeyValueStore;

/// Key-value store persisted in the `kv_store` table of a local libSQL file.
///
/// Each write is a single `INSERT OR REPLACE`, which `SQLite` applies
/// atomically.
#[derive(Clone)]
pub struct LibSqlKeyValueStore {
    db: Arc<Database>,
}

impl LibSqlKeyValueStore {
    /// Wrap an already opened database
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Open (or create) the database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?))
    }
}

impl KeyValueStore for LibSqlKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT value FROM kv_store WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
                libsql::params![key.to_string(), value.to_string(), now],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_read_missing_key() {
        let store = LibSqlKeyValueStore::open_in_memory().await.unwrap();
        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_write_replaces_value() {
        let store = LibSqlKeyValueStore::open_in_memory().await.unwrap();

        store.write("queue", "[]").await.unwrap();
        store.write("queue", "[1]").await.unwrap();

        assert_eq!(store.read("queue").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_key() {
        let store = LibSqlKeyValueStore::open_in_memory().await.unwrap();
        store.write("queue", "[]").await.unwrap();

        store.remove("queue").await.unwrap();
        store.remove("queue").await.unwrap();
        assert_eq!(store.read("queue").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_value_survives_reopen() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("greenhouse.db");

        {
            let store = LibSqlKeyValueStore::open(&db_path).await.unwrap();
            store.write("@queue", "[\"kept\"]").await.unwrap();
        }

        let reopened = LibSqlKeyValueStore::open(&db_path).await.unwrap();
        assert_eq!(
            reopened.read("@queue").await.unwrap().as_deref(),
            Some("[\"kept\"]")
        );
    }
}
