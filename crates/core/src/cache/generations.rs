//! Named cache generations.
//!
//! A generation is a bucket of stored request/response pairs identified by a
//! versioned name. Generations are created on first open and removed only as
//! a whole; deleting one cascades to its entries.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

/// Handle to one open cache generation.
///
/// Obtained from [`CacheDb::open_cache`]; the strategies receive it
/// explicitly instead of looking generations up by name.
#[derive(Clone, Debug)]
pub struct Cache {
    pub(crate) db: CacheDb,
    pub(crate) name: String,
}

impl Cache {
    /// Generation name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Open a generation by name, creating it if it doesn't exist.
    pub async fn open_cache(&self, name: &str) -> Result<Cache, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let inserted = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let n = conn.execute(
                    "INSERT OR IGNORE INTO cache_names (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(n)
            })
            .await
            .map_err(Error::from)?;

        if inserted > 0 {
            tracing::debug!(cache = name, "created cache generation");
        }

        Ok(Cache { db: self.clone(), name: name.to_string() })
    }

    /// Whether a generation with this name exists.
    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_names WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All generation names in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_names ORDER BY seq ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry in it.
    ///
    /// Returns false if no generation had that name.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_names WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl CacheDb {
    /// Make every later attempt to delete `name` fail with a database error.
    pub async fn lock_generation(&self, name: &str) -> Result<(), Error> {
        let sql = format!(
            "CREATE TRIGGER IF NOT EXISTS lock_generation_{} BEFORE DELETE ON cache_names
             WHEN OLD.name = '{}'
             BEGIN SELECT RAISE(ABORT, 'generation is locked'); END;",
            hex::encode(name),
            name.replace('\'', "''"),
        );
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
