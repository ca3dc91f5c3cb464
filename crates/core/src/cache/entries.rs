//! Stored request/response entries.
//!
//! Entries are keyed by request identity (method + URL) within a
//! generation. Writes are UPSERTs, so the newest response for a key wins.

use super::connection::CacheDb;
use super::generations::Cache;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response snapshot as stored in a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// First header value with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    fn key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

/// A stored entry together with where and when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub cache_name: String,
    pub stored_at: String,
    pub response: CachedResponse,
}

struct EntryRow {
    cache_name: String,
    method: String,
    url: String,
    status_code: u16,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl TryFrom<EntryRow> for CacheEntry {
    type Error = Error;

    fn try_from(row: EntryRow) -> Result<Self, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&row.headers_json)?;
        Ok(CacheEntry {
            cache_name: row.cache_name,
            stored_at: row.stored_at,
            response: CachedResponse {
                method: row.method,
                url: row.url,
                status_code: row.status_code,
                headers,
                body: row.body,
            },
        })
    }
}

const SELECT_COLUMNS: &str = "e.cache_name, e.method, e.url, e.status_code, e.headers_json, e.body, e.stored_at";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        cache_name: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        status_code: row.get(3)?,
        headers_json: row.get(4)?,
        body: row.get(5)?,
        stored_at: row.get(6)?,
    })
}

fn ensure_get(response: &CachedResponse) -> Result<(), Error> {
    if response.method.eq_ignore_ascii_case("GET") {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("only GET requests can be cached, got {}", response.method)))
    }
}

fn upsert(conn: &rusqlite::Connection, cache_name: &str, response: &CachedResponse, stored_at: &str) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT INTO cache_entries (
            cache_name, key_hash, method, url, status_code, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(cache_name, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status_code = excluded.status_code,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            cache_name,
            response.key(),
            response.method.to_ascii_uppercase(),
            &response.url,
            response.status_code,
            headers_json,
            &response.body,
            stored_at,
        ],
    )?;
    Ok(())
}

impl Cache {
    /// Store a response, replacing any previous entry for the same request.
    pub async fn put(&self, response: &CachedResponse) -> Result<(), Error> {
        ensure_get(response)?;
        let response = response.clone();
        let cache_name = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> { upsert(conn, &cache_name, &response, &stored_at) })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of responses in one transaction.
    ///
    /// Either every response is written or none is.
    pub async fn put_all(&self, responses: Vec<CachedResponse>) -> Result<usize, Error> {
        for response in &responses {
            ensure_get(response)?;
        }
        let cache_name = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                for response in &responses {
                    upsert(&tx, &cache_name, response, &stored_at)?;
                }
                tx.commit()?;
                Ok(responses.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in this generation only.
    pub async fn match_request(&self, method: &str, url: &str) -> Result<Option<CacheEntry>, Error> {
        let key = compute_request_key(method, url);
        let cache_name = self.name.clone();
        let sql = format!("SELECT {SELECT_COLUMNS} FROM cache_entries e WHERE e.cache_name = ?1 AND e.key_hash = ?2");
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(&sql, params![cache_name, key], read_row);
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(CacheEntry::try_from).transpose()
    }

    /// URLs stored in this generation, oldest write first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let cache_name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY stored_at ASC, url ASC",
                )?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Look up a request across every generation.
    ///
    /// Generations are searched in creation order; the first hit wins.
    pub async fn match_any(&self, method: &str, url: &str) -> Result<Option<CacheEntry>, Error> {
        let key = compute_request_key(method, url);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM cache_entries e
             JOIN cache_names n ON n.name = e.cache_name
             WHERE e.key_hash = ?1
             ORDER BY n.seq ASC
             LIMIT 1"
        );
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(&sql, params![key], read_row);
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(CacheEntry::try_from).transpose()
    }

    /// Number of entries in a generation.
    pub async fn entry_count(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(url: &str, body: &str) -> CachedResponse {
        CachedResponse {
            method: "GET".to_string(),
            url: url.to_string(),
            status_code: 200,
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("dynamic").await.unwrap();
        let response = make_response("https://example.com/menu.html", "<h1>Menu</h1>");

        cache.put(&response).await.unwrap();

        let entry = cache
            .match_request("GET", "https://example.com/menu.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.cache_name, "dynamic");
        assert_eq!(entry.response, response);
        assert_eq!(entry.response.content_type(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("dynamic").await.unwrap();

        cache.put(&make_response("https://example.com/", "old")).await.unwrap();
        cache.put(&make_response("https://example.com/", "new")).await.unwrap();

        let entry = db.match_any("GET", "https://example.com/").await.unwrap().unwrap();
        assert_eq!(entry.response.body, b"new");
        assert_eq!(db.entry_count("dynamic").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("dynamic").await.unwrap();
        let mut response = make_response("https://example.com/api/reservations", "{}");
        response.method = "POST".to_string();

        assert!(matches!(cache.put(&response).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.open_cache("static").await.unwrap();
        let second = db.open_cache("dynamic").await.unwrap();

        second.put(&make_response("https://example.com/", "dynamic")).await.unwrap();
        first.put(&make_response("https://example.com/", "static")).await.unwrap();

        let entry = db.match_any("GET", "https://example.com/").await.unwrap().unwrap();
        assert_eq!(entry.cache_name, "static");
        assert_eq!(entry.response.body, b"static");
    }

    #[tokio::test]
    async fn test_match_any_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_cache("static").await.unwrap();
        assert!(db.match_any("GET", "https://example.com/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = db.open_cache("static").await.unwrap();
        let mut bad = make_response("https://example.com/b", "b");
        bad.method = "PUT".to_string();

        let result = cache
            .put_all(vec![make_response("https://example.com/a", "a"), bad])
            .await;
        assert!(result.is_err());
        assert_eq!(db.entry_count("static").await.unwrap(), 0);

        let written = cache
            .put_all(vec![make_response("https://example.com/a", "a"), make_response("https://example.com/b", "b")])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(cache.keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cache_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let old = db.open_cache("static-v0").await.unwrap();
        old.put(&make_response("https://example.com/", "old")).await.unwrap();

        db.delete_cache("static-v0").await.unwrap();

        assert_eq!(db.entry_count("static-v0").await.unwrap(), 0);
        assert!(db.match_any("GET", "https://example.com/").await.unwrap().is_none());
    }
}
