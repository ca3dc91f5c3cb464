//! The offline cache router.
//!
//! ### Request path
//! - GET requests on non-extension schemes are intercepted; everything else
//!   goes straight to the network.
//! - [`RouteTable::classify`] picks a [`Strategy`], the strategy runs against
//!   the network and the cache generations, and any failure ends in the
//!   offline fallback.
//!
//! ### Lifecycle
//! - `Parsed -> Installing -> Installed -> Activating -> Activated`.
//! - A failed install ends in `Redundant` and never activates.
//! - Activation can be re-run; it only deletes non-current generations.
//!
//! ### Side work
//! - Background sync posts queued reservations.
//! - Push messages become notifications; clicks may open a window.

pub mod lifecycle;
pub mod offline;
pub mod push;
pub mod route;
mod strategy;
pub mod sync;
pub mod tasks;

use std::sync::{Arc, Mutex};

use bistro_core::manifest::{DYNAMIC_CACHE, RESERVATION_SYNC_TAG, RESERVATIONS_ENDPOINT, STATIC_FILES};
use bistro_core::{CacheDb, Error};
use serde_json::Value;
use url::Url;

pub use lifecycle::{ActivateReport, InstallReport, WorkerState};
pub use push::{Notification, NotificationData, Notifier, PushPayload, TracingNotifier};
pub use route::{RouteTable, Strategy};
pub use sync::{ReservationQueue, SyncReport};
pub use tasks::BackgroundTasks;

use crate::fetch::{Fetcher, Request, Response, resolve};
use strategy::StrategyContext;

/// Marks the worker redundant if an install is abandoned mid-flight.
struct InstallGuard<'a> {
    worker: &'a ServiceWorker,
    finished: bool,
}

impl InstallGuard<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("install abandoned");
            self.worker.set_state(WorkerState::Redundant);
        }
    }
}

/// What the router does with a request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the page talks to the network itself.
    Bypass,
    Respond(Result<Response, Error>),
}

pub struct ServiceWorker {
    storage: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    routes: RouteTable,
    manifest: Vec<String>,
    state: Mutex<WorkerState>,
    tasks: BackgroundTasks,
    queue: Arc<dyn ReservationQueue>,
    notifier: Arc<dyn Notifier>,
}

impl ServiceWorker {
    /// A freshly parsed worker with the default tables and manifest.
    ///
    /// The reservation queue lives in the same database as the caches.
    pub fn new(storage: CacheDb, fetcher: Arc<dyn Fetcher>, origin: Url) -> Self {
        let queue: Arc<dyn ReservationQueue> = Arc::new(storage.clone());
        Self {
            storage,
            fetcher,
            origin,
            routes: RouteTable::default(),
            manifest: STATIC_FILES.iter().map(|s| s.to_string()).collect(),
            state: Mutex::new(WorkerState::Parsed),
            tasks: BackgroundTasks::new(),
            queue,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = manifest.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_queue(mut self, queue: Arc<dyn ReservationQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }

    fn set_state(&self, next: WorkerState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *state;
        tracing::info!(from = %current, to = %next, "worker state change");
        *state = next;
    }

    /// Move to `next` if the current state is one of `allowed`; returns the
    /// state that was left.
    fn transition(&self, allowed: &[WorkerState], next: WorkerState) -> Result<WorkerState, Error> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *state;
        if !allowed.contains(&current) {
            return Err(Error::InvalidState(format!("cannot move from {current} to {next}")));
        }
        tracing::info!(from = %current, to = %next, "worker state change");
        *state = next;
        Ok(current)
    }

    /// Cache the manifest into the static generation.
    ///
    /// On failure the worker becomes redundant and the error is returned.
    ///
    /// Dropping the future before it finishes also leaves the worker
    /// redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[WorkerState::Parsed], WorkerState::Installing)?;
        let guard = InstallGuard { worker: self, finished: false };

        let result = lifecycle::install(&self.storage, &self.fetcher, &self.origin, &self.manifest).await;
        guard.finish();

        match result {
            Ok(report) => {
                self.set_state(WorkerState::Installed);
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    /// Delete stale generations and take control.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let previous = self.transition(&[WorkerState::Installed, WorkerState::Activated], WorkerState::Activating)?;

        match lifecycle::activate(&self.storage).await {
            Ok(report) => {
                self.set_state(WorkerState::Activated);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "activation failed");
                self.set_state(previous);
                Err(e)
            }
        }
    }

    /// Route one request.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if !RouteTable::intercepts(request) {
            tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
            return FetchOutcome::Bypass;
        }
        FetchOutcome::Respond(self.route(request).await)
    }

    /// Route one request, sending bypassed ones to the network.
    pub async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        match self.handle_fetch(request).await {
            FetchOutcome::Bypass => self.fetcher.fetch(request).await,
            FetchOutcome::Respond(result) => result,
        }
    }

    async fn route(&self, request: &Request) -> Result<Response, Error> {
        let strategy = self.routes.classify(request);
        tracing::debug!(url = %request.url, %strategy, "routing request");

        let result = match self.storage.open_cache(DYNAMIC_CACHE).await {
            Ok(dynamic) => {
                let ctx = StrategyContext {
                    fetcher: &self.fetcher,
                    storage: &self.storage,
                    dynamic: &dynamic,
                    tasks: &self.tasks,
                };
                match strategy {
                    Strategy::NetworkFirst => strategy::network_first(&ctx, request).await,
                    Strategy::CacheFirst => strategy::cache_first(&ctx, request).await,
                    Strategy::StaleWhileRevalidate => strategy::stale_while_revalidate(&ctx, request).await,
                }
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => Ok(response),
            Err(e) => {
                if e.is_network() {
                    tracing::debug!(url = %request.url, error = %e, "serving offline fallback");
                } else {
                    tracing::warn!(url = %request.url, error = %e, "routing failed, serving offline fallback");
                }
                offline::offline_response(&self.storage, &self.origin, request).await
            }
        }
    }

    /// Queue a reservation for the next sync.
    pub async fn enqueue_reservation(&self, data: &Value) -> Result<i64, Error> {
        self.queue.enqueue(data).await
    }

    /// Run background sync for `tag`. Unknown tags are ignored.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<SyncReport>, Error> {
        if tag != RESERVATION_SYNC_TAG {
            tracing::debug!(tag, "ignoring sync tag");
            return Ok(None);
        }

        let endpoint = resolve(&self.origin, RESERVATIONS_ENDPOINT).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let report = sync::sync_reservations(&self.fetcher, self.queue.as_ref(), &endpoint).await;
        tracing::info!(attempted = report.attempted, synced = report.synced, failed = report.failed, "sync finished");
        Ok(Some(report))
    }

    pub async fn handle_push(&self, raw: Option<&[u8]>) -> Result<Option<Notification>, Error> {
        push::handle_push(self.notifier.as_ref(), raw).await
    }

    pub async fn handle_notification_click(
        &self, action: Option<&str>, data: &NotificationData,
    ) -> Result<Option<String>, Error> {
        push::handle_notification_click(self.notifier.as_ref(), action, data).await
    }

    /// Wait for background cache writes and revalidations.
    pub async fn settle(&self) {
        tracing::debug!(pending = self.tasks.pending(), "settling background tasks");
        self.tasks.settle().await;
    }
}
