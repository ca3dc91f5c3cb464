//! Background sync of reservations submitted while offline.

use std::sync::Arc;

use async_trait::async_trait;
use bistro_core::{CacheDb, Error, PendingReservation};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::fetch::{Fetcher, Request};

/// Durable store of reservations waiting to be posted.
#[async_trait]
pub trait ReservationQueue: Send + Sync {
    async fn enqueue(&self, data: &Value) -> Result<i64, Error>;
    async fn pending(&self) -> Result<Vec<PendingReservation>, Error>;
    async fn remove(&self, id: i64) -> Result<(), Error>;
    async fn record_failure(&self, id: i64) -> Result<(), Error>;
}

#[async_trait]
impl ReservationQueue for CacheDb {
    async fn enqueue(&self, data: &Value) -> Result<i64, Error> {
        self.enqueue_reservation(data).await
    }

    async fn pending(&self) -> Result<Vec<PendingReservation>, Error> {
        self.pending_reservations().await
    }

    async fn remove(&self, id: i64) -> Result<(), Error> {
        self.remove_reservation(id).await.map(|_| ())
    }

    async fn record_failure(&self, id: i64) -> Result<(), Error> {
        self.record_sync_attempt(id).await
    }
}

/// Counts from one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

async fn post_one(fetcher: &Arc<dyn Fetcher>, endpoint: &Url, reservation: &PendingReservation) -> Result<(), Error> {
    let request = Request::post_json(endpoint.clone(), &reservation.data)?;
    let response = fetcher.fetch(&request).await?;
    if response.ok() {
        Ok(())
    } else {
        Err(Error::Network(format!("{endpoint}: status {}", response.status.as_u16())))
    }
}

/// Post each queued reservation; drop the ones the server accepted.
///
/// Records are independent: a failure leaves that record queued and the
/// run moves on to the next one.
pub(crate) async fn sync_reservations(
    fetcher: &Arc<dyn Fetcher>, queue: &dyn ReservationQueue, endpoint: &Url,
) -> SyncReport {
    let pending = match queue.pending().await {
        Ok(pending) => pending,
        Err(e) => {
            tracing::error!(error = %e, "background sync failed to read queue");
            return SyncReport::default();
        }
    };

    let mut report = SyncReport { attempted: pending.len(), ..Default::default() };

    for reservation in &pending {
        let outcome = match post_one(fetcher, endpoint, reservation).await {
            Ok(()) => queue.remove(reservation.id).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(id = reservation.id, "reservation synced");
                report.synced += 1;
            }
            Err(e) => {
                tracing::warn!(id = reservation.id, error = %e, "failed to sync reservation");
                if let Err(e) = queue.record_failure(reservation.id).await {
                    tracing::warn!(id = reservation.id, error = %e, "failed to record sync attempt");
                }
                report.failed += 1;
            }
        }
    }

    report
}
