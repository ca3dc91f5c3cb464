//! Install and activate.
//!
//! Install fills the static generation from the manifest, all or nothing.
//! Activate deletes every generation that is not current; a failed
//! deletion is logged and does not stop activation.

use std::fmt;
use std::sync::Arc;

use bistro_core::manifest::{STATIC_CACHE, is_current_generation};
use bistro_core::{CacheDb, Error};
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use url::Url;

use crate::fetch::{Fetcher, Request, resolve};

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version never activates.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        })
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub cache: String,
    pub cached: usize,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

/// Fetch every manifest entry and store them in the static generation.
///
/// Any unreachable entry or non-ok status fails the install and nothing
/// is written.
pub(crate) async fn install(
    storage: &CacheDb, fetcher: &Arc<dyn Fetcher>, origin: &Url, manifest: &[String],
) -> Result<InstallReport, Error> {
    let cache = storage.open_cache(STATIC_CACHE).await?;

    let requests = manifest
        .iter()
        .map(|entry| {
            resolve(origin, entry)
                .map(Request::get)
                .map_err(|e| Error::InstallFailed(format!("{entry}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let responses = try_join_all(requests.iter().map(|request| async move {
        let response = fetcher
            .fetch(request)
            .await
            .map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
        if !response.ok() {
            return Err(Error::InstallFailed(format!("{}: status {}", request.url, response.status.as_u16())));
        }
        Ok(response.to_cached(request.method.as_str(), &request.cache_url()))
    }))
    .await?;

    let cached = cache.put_all(responses).await?;
    tracing::info!(cache = STATIC_CACHE, cached, "static files cached");

    Ok(InstallReport { cache: STATIC_CACHE.to_string(), cached })
}

/// Delete every generation that is not current.
pub(crate) async fn activate(storage: &CacheDb) -> Result<ActivateReport, Error> {
    let stale: Vec<String> = storage
        .cache_names()
        .await?
        .into_iter()
        .filter(|name| !is_current_generation(name))
        .collect();

    let results = join_all(stale.iter().map(|name| async move {
        tracing::info!(cache = %name, "deleting old cache");
        (name.clone(), storage.delete_cache(name).await)
    }))
    .await;

    let mut report = ActivateReport::default();
    for (name, result) in results {
        match result {
            Ok(_) => report.deleted.push(name),
            Err(e) => {
                tracing::warn!(cache = %name, error = %e, "failed to delete old cache");
                report.failed.push(name);
            }
        }
    }

    Ok(report)
}
