//! Persistent (L2) cache tier: a SQLite-backed key/value/TTL store.
//!
//! Blocking `rusqlite` calls are wrapped in `tokio::task::spawn_blocking` so
//! the async callers above never block the executor. Schema is a plain
//! `key -> (bytes, expires_at)` table shared by both cache namespaces.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SearchError};

#[derive(Debug)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_buf = db_path.as_ref().to_path_buf();
        let is_new_file = !db_path_buf.exists();

        if let Some(parent) = db_path_buf.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_for_task = db_path_buf.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = open_connection(&path_for_task)?;

            if is_new_file {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(&path_for_task, std::fs::Permissions::from_mode(0o600))?;
                }
            }

            initialize_schema(&conn)
        })
        .await
        .map_err(|e| SearchError::Cache(format!("failed to spawn cache init: {e}")))??;

        Ok(Self { db_path: db_path_buf })
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.get_with_expiry(key).await?.map(|(data, _)| data))
    }

    /// Same as [`Self::get`], but also hands back the entry's `expires_at`
    /// so a caller promoting the value into another tier (the L1 hot tier)
    /// can reuse this tier's own expiry instead of minting a fresh one.
    pub async fn get_with_expiry(&self, key: &str) -> Result<Option<(Vec<u8>, DateTime<Utc>)>> {
        let db_path = self.db_path.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<(Vec<u8>, DateTime<Utc>)>> {
            let conn = open_connection(&db_path)?;

            let row: Option<(Vec<u8>, String)> = conn
                .query_row(
                    "SELECT data, expires_at FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| SearchError::Cache(format!("cache read failed: {e}")))?;

            match row {
                None => Ok(None),
                Some((data, expires_at)) => {
                    let expires_at = DateTime::parse_from_rfc3339(&expires_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now() - Duration::seconds(1));
                    if expires_at < Utc::now() {
                        // Expired: treat as a miss and clean up lazily.
                        let _ = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key]);
                        Ok(None)
                    } else {
                        Ok(Some((data, expires_at)))
                    }
                }
            }
        })
        .await
        .map_err(|e| SearchError::Cache(format!("failed to spawn cache read: {e}")))?
    }

    pub async fn set(&self, key: &str, data: Vec<u8>, ttl: std::time::Duration) -> Result<()> {
        let db_path = self.db_path.clone();
        let key = key.to_string();
        let now = Utc::now();
        let expires_at = now + Duration::from_std(ttl).unwrap_or(Duration::zero());

        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = open_connection(&db_path)?;
            conn.execute(
                "INSERT INTO cache_entries (key, data, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                    data = excluded.data,
                    created_at = excluded.created_at,
                    expires_at = excluded.expires_at",
                params![key, data, now.to_rfc3339(), expires_at.to_rfc3339()],
            )
            .map_err(|e| SearchError::Cache(format!("cache write failed: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| SearchError::Cache(format!("failed to spawn cache write: {e}")))?
    }

    #[cfg(test)]
    pub async fn remove(&self, key: &str) -> Result<()> {
        let db_path = self.db_path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = open_connection(&db_path)?;
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                .map_err(|e| SearchError::Cache(format!("cache delete failed: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| SearchError::Cache(format!("failed to spawn cache delete: {e}")))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    Connection::open(path).map_err(|e| SearchError::Cache(format!("failed to open cache database: {e}")))
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            data BLOB NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| SearchError::Cache(format!("failed to initialize cache schema: {e}")))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at)",
        [],
    )
    .map_err(|e| SearchError::Cache(format!("failed to create expires_at index: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (SqliteStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::open(dir.path().join("cache.db")).await.unwrap();
        (storage, dir)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let (storage, _dir) = store().await;
        storage
            .set("k", b"hello".to_vec(), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (storage, _dir) = store().await;
        assert_eq!(storage.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let (storage, _dir) = store().await;
        storage
            .set("k", b"hello".to_vec(), std::time::Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(storage.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_existing_key() {
        let (storage, _dir) = store().await;
        storage
            .set("k", b"first".to_vec(), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        storage
            .set("k", b"second".to_vec(), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(b"second".to_vec()));
    }
}
