//! Partition and entry operations on the SQLite backend.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row};

use super::connection::CacheDb;
use super::{CacheKey, CacheStore};
use crate::Error;
use crate::http::{Method, Response};

/// Entry count of one partition, as reported by maintenance tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: u64,
}

const RESPONSE_COLUMNS: &str = "e.status, e.status_text, e.headers_json, e.body, e.final_url";

fn read_response(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, Vec<u8>, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_response(
    (status, status_text, headers_json, body, url): (i64, String, String, Vec<u8>, Option<String>),
) -> Result<Response, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
    Ok(Response { status, status_text, headers, body: Bytes::from(body), url })
}

fn insert_partition(conn: &rusqlite::Connection, partition: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, chrono::Utc::now().to_rfc3339()],
    )
}

fn upsert_entry(
    conn: &rusqlite::Connection, partition: &str, key: &CacheKey, response: &Response,
) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
    conn.execute(
        "INSERT INTO entries (
            partition, key_hash, method, url, status, status_text,
            headers_json, body, final_url, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(partition, key_hash) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            final_url = excluded.final_url,
            stored_at = excluded.stored_at",
        params![
            partition,
            key.digest(),
            key.method.as_str(),
            &key.url,
            response.status as i64,
            &response.status_text,
            headers_json,
            response.body.as_ref(),
            &response.url,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait::async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_partition(conn, &partition)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![partition])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_partition(&tx, &partition)?;
                upsert_entry(&tx, &partition, &key, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_partition(&tx, &partition)?;
                for (key, response) in &entries {
                    upsert_entry(&tx, &partition, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let hash = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        &format!("SELECT {RESPONSE_COLUMNS} FROM entries e WHERE e.partition = ?1 AND e.key_hash = ?2"),
                        params![partition, hash],
                        read_response,
                    )
                    .optional()?;
                row.map(decode_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &CacheKey) -> Result<Option<Response>, Error> {
        let hash = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        &format!(
                            "SELECT {RESPONSE_COLUMNS} FROM entries e
                             JOIN partitions p ON p.name = e.partition
                             WHERE e.key_hash = ?1
                             ORDER BY p.seq ASC LIMIT 1"
                        ),
                        params![hash],
                        read_response,
                    )
                    .optional()?;
                row.map(decode_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE partition = ?1 ORDER BY rowid ASC")?;
                let rows = stmt
                    .query_map(params![partition], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows.into_iter()
                    .map(|(method, url)| Ok(CacheKey { method: method.parse::<Method>()?, url }))
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, partition: &str, key: &CacheKey) -> Result<bool, Error> {
        let partition = partition.to_string();
        let hash = key.digest();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                    params![partition, hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn count(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Delete entries in `partition` whose URL contains `marker`.
    ///
    /// The match is a case-sensitive substring test, the same one activation
    /// uses; `%` and `_` in the marker are literal. Returns the number of
    /// deleted entries.
    pub async fn purge_entries_matching(&self, partition: &str, marker: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        let marker = marker.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND instr(url, ?2) > 0",
                    params![partition, marker],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry counts for every partition, in creation order.
    pub async fn summaries(&self) -> Result<Vec<PartitionSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key_hash) FROM partitions p
                     LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name ORDER BY p.seq ASC",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(PartitionSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(url: &str) -> CacheKey {
        CacheKey::parse(Method::Get, url).unwrap()
    }

    fn json_response(body: &str) -> Response {
        Response::new(200, body.to_string())
            .with_header("Content-Type", "application/json")
            .with_header("Cache-Control", "max-age=60")
    }

    #[tokio::test]
    async fn test_put_and_get_verbatim() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("https://api.jikan.moe/v4/anime/52991");
        let response = json_response(r#"{"data":{"mal_id":52991}}"#);

        db.put("otakudb-api-v1", &k, &response).await.unwrap();

        let stored = db.get("otakudb-api-v1", &k).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get("otakudb-api-v1", &key("https://api.jikan.moe/v4/anime/1")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("https://api.jikan.moe/v4/anime/1");
        db.put("p", &k, &json_response("old")).await.unwrap();
        db.put("p", &k, &json_response("new")).await.unwrap();

        assert_eq!(db.get("p", &k).await.unwrap().unwrap().text(), "new");
        assert_eq!(db.count("p").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_partition_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("http://localhost:8080/index.html");
        db.put("otakudb-static-v0", &k, &Response::new(200, "<html>")).await.unwrap();

        assert!(db.delete_partition("otakudb-static-v0").await.unwrap());
        assert!(db.partitions().await.unwrap().is_empty());
        assert!(db.match_any(&k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let k = key("http://localhost:8080/");
        db.open("first").await.unwrap();
        db.put("second", &k, &Response::new(200, "second")).await.unwrap();
        db.put("first", &k, &Response::new(200, "first")).await.unwrap();

        assert_eq!(db.partitions().await.unwrap(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(db.match_any(&k).await.unwrap().unwrap().text(), "first");
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = key("https://api.jikan.moe/v4/anime/1");
        let b = key("http://localhost:4000/api/anime-list");
        db.put_all("api", vec![(a.clone(), json_response("a")), (b.clone(), json_response("b"))])
            .await
            .unwrap();

        assert_eq!(db.keys("api").await.unwrap(), vec![a.clone(), b.clone()]);
        assert!(db.delete("api", &b).await.unwrap());
        assert!(!db.delete("api", &b).await.unwrap());
        assert_eq!(db.keys("api").await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn test_purge_entries_matching() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("api", &key("http://localhost:4000/api/me"), &json_response("stale"))
            .await
            .unwrap();
        db.put("api", &key("https://api.jikan.moe/v4/anime/1"), &json_response("fresh"))
            .await
            .unwrap();

        let deleted = db.purge_entries_matching("api", "localhost:4000").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.count("api").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_marker_is_literal_and_case_sensitive() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("api", &key("https://api.jikan.moe/v4/anime-list"), &json_response("a"))
            .await
            .unwrap();
        db.put("api", &key("https://api.jikan.moe/v4/Seasons/now"), &json_response("b"))
            .await
            .unwrap();
        db.put("api", &key("https://api.jikan.moe/v4/anime_list"), &json_response("c"))
            .await
            .unwrap();

        assert_eq!(db.purge_entries_matching("api", "anime_list").await.unwrap(), 1);
        assert_eq!(db.purge_entries_matching("api", "/seasons/").await.unwrap(), 0);
        assert_eq!(db.purge_entries_matching("api", "%").await.unwrap(), 0);
        assert_eq!(db.count("api").await.unwrap(), 2);
        assert!(db.get("api", &key("https://api.jikan.moe/v4/anime-list")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_summaries_include_empty_partitions() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("otakudb-image-v1").await.unwrap();
        db.put("otakudb-api-v1", &key("https://api.jikan.moe/v4/anime/1"), &json_response("x"))
            .await
            .unwrap();

        let summaries = db.summaries().await.unwrap();
        assert_eq!(
            summaries,
            vec![
                PartitionSummary { name: "otakudb-image-v1".into(), entries: 0 },
                PartitionSummary { name: "otakudb-api-v1".into(), entries: 1 },
            ]
        );
    }
}
