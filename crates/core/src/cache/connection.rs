//! Cache storage file.
//!
//! One SQLite file holds every partition. It runs in WAL mode so reads from
//! the router are not blocked by write-through, and foreign keys are on so
//! deleting a partition drops its entries.

use std::path::Path;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA foreign_keys=ON;
     PRAGMA busy_timeout=5000;";

/// SQLite-backed [`CacheStore`](super::CacheStore).
///
/// Statements run on tokio-rusqlite's background thread. Clones share the
/// same connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open the storage file at `path`, creating it and any missing parent
    /// directories, then bring the schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::InvalidInput(format!("cannot create {}: {e}", dir.display())))?;
        }

        tracing::debug!(path = %path.display(), "opening cache storage");
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Storage that lives and dies with the process.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, CacheStore};
    use crate::http::{Method, Response};

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let foreign_keys: i64 = db
            .conn
            .call(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = std::env::temp_dir().join(format!("otaku-sw-{}", std::process::id()));
        let path = dir.join("nested").join("cache.sqlite");
        let key = CacheKey::parse(Method::Get, "http://localhost:8080/").unwrap();

        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put("otakudb-static-v1", &key, &Response::new(200, "shell")).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        let stored = db.get("otakudb-static-v1", &key).await.unwrap().unwrap();
        assert_eq!(stored.text(), "shell");

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
