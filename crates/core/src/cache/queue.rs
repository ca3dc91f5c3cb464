//! Durable queue of reservations submitted while offline.
//!
//! Records stay queued until a sync run posts them successfully.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A reservation waiting for background sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReservation {
    pub id: i64,
    /// The form payload exactly as submitted.
    pub data: serde_json::Value,
    pub queued_at: String,
    /// Failed sync attempts so far.
    pub attempts: u32,
}

impl CacheDb {
    /// Queue a reservation. Returns its id.
    pub async fn enqueue_reservation(&self, data: &serde_json::Value) -> Result<i64, Error> {
        if !data.is_object() {
            return Err(Error::InvalidInput("reservation data must be a JSON object".into()));
        }
        let data_json = serde_json::to_string(data)?;
        let queued_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_reservations (data_json, queued_at) VALUES (?1, ?2)",
                    params![data_json, queued_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// All queued reservations, oldest first.
    pub async fn pending_reservations(&self) -> Result<Vec<PendingReservation>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(i64, String, String, u32)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, data_json, queued_at, attempts FROM pending_reservations ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(id, data_json, queued_at, attempts)| {
                Ok(PendingReservation { id, data: serde_json::from_str(&data_json)?, queued_at, attempts })
            })
            .collect()
    }

    /// Remove a reservation after it synced. Returns false if it was already gone.
    pub async fn remove_reservation(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM pending_reservations WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Bump the failed-attempt counter of a reservation.
    pub async fn record_sync_attempt(&self, id: i64) -> Result<(), Error> {
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE pending_reservations SET attempts = attempts + 1 WHERE id = ?1",
                    params![id],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enqueue_and_list() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db
            .enqueue_reservation(&json!({"name": "Ada", "guests": "2"}))
            .await
            .unwrap();
        let second = db
            .enqueue_reservation(&json!({"name": "Grace", "guests": "4"}))
            .await
            .unwrap();
        assert!(second > first);

        let pending = db.pending_reservations().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first);
        assert_eq!(pending[0].data["name"], "Ada");
        assert_eq!(pending[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_non_object() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.enqueue_reservation(&json!(["not", "an", "object"])).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_remove_and_attempts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db.enqueue_reservation(&json!({"name": "Ada"})).await.unwrap();

        db.record_sync_attempt(id).await.unwrap();
        db.record_sync_attempt(id).await.unwrap();
        assert_eq!(db.pending_reservations().await.unwrap()[0].attempts, 2);

        assert!(db.remove_reservation(id).await.unwrap());
        assert!(!db.remove_reservation(id).await.unwrap());
        assert!(db.pending_reservations().await.unwrap().is_empty());
    }
}
