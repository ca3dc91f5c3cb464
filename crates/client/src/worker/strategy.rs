//! The three caching strategies.
//!
//! Each strategy receives the storage handle and the open dynamic
//! generation explicitly. Writes of fresh responses into the dynamic
//! generation run as background tasks and never delay the response.

use std::sync::Arc;

use bistro_core::{Cache, CacheDb, Error};
use tokio::sync::oneshot;

use super::tasks::BackgroundTasks;
use crate::fetch::{Fetcher, Request, Response};

/// Everything a strategy may touch.
pub(crate) struct StrategyContext<'a> {
    pub fetcher: &'a Arc<dyn Fetcher>,
    pub storage: &'a CacheDb,
    pub dynamic: &'a Cache,
    pub tasks: &'a BackgroundTasks,
}

/// Look up a request in any generation.
pub(crate) async fn lookup(storage: &CacheDb, request: &Request) -> Result<Option<Response>, Error> {
    match storage.match_any(request.method.as_str(), &request.cache_url()).await? {
        Some(entry) => Ok(Some(Response::from_entry(entry)?)),
        None => Ok(None),
    }
}

fn store_in_background(ctx: &StrategyContext<'_>, request: &Request, response: &Response) {
    let cached = response.to_cached(request.method.as_str(), &request.cache_url());
    let dynamic = ctx.dynamic.clone();
    ctx.tasks.spawn(async move {
        if let Err(e) = dynamic.put(&cached).await {
            tracing::warn!(url = %cached.url, cache = dynamic.name(), error = %e, "failed to cache response");
        }
    });
}

/// Prefer the live network; fall back to any cached copy on failure.
pub(crate) async fn network_first(ctx: &StrategyContext<'_>, request: &Request) -> Result<Response, Error> {
    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            if response.ok() {
                store_in_background(ctx, request, &response);
            }
            Ok(response)
        }
        Err(err) => {
            tracing::debug!(url = %request.url, error = %err, "network failed, trying cache");
            match lookup(ctx.storage, request).await? {
                Some(cached) => Ok(cached),
                None => Err(err),
            }
        }
    }
}

/// Prefer any cached copy; go to the network only on a miss.
pub(crate) async fn cache_first(ctx: &StrategyContext<'_>, request: &Request) -> Result<Response, Error> {
    if let Some(cached) = lookup(ctx.storage, request).await? {
        tracing::debug!(url = %request.url, "cache hit");
        return Ok(cached);
    }

    let response = ctx.fetcher.fetch(request).await?;
    if response.ok() {
        store_in_background(ctx, request, &response);
    }
    Ok(response)
}

/// Answer from cache right away and refresh the entry in the background.
///
/// On a miss the caller waits for the same background fetch.
pub(crate) async fn stale_while_revalidate(ctx: &StrategyContext<'_>, request: &Request) -> Result<Response, Error> {
    let cached = lookup(ctx.storage, request).await?;

    let (tx, rx) = oneshot::channel();
    let fetcher = Arc::clone(ctx.fetcher);
    let dynamic = ctx.dynamic.clone();
    let background = request.clone();
    ctx.tasks.spawn(async move {
        match fetcher.fetch(&background).await {
            Ok(response) => {
                let copy = response.ok().then(|| response.to_cached(background.method.as_str(), &background.cache_url()));
                let _ = tx.send(Ok(response));
                if let Some(copy) = copy
                    && let Err(e) = dynamic.put(&copy).await
                {
                    tracing::debug!(url = %copy.url, error = %e, "revalidation write failed");
                }
            }
            Err(e) => {
                tracing::debug!(url = %background.url, error = %e, "revalidation fetch failed");
                let _ = tx.send(Err(e));
            }
        }
    });

    if let Some(cached) = cached {
        tracing::debug!(url = %request.url, "serving stale copy while revalidating");
        return Ok(cached);
    }

    rx.await
        .map_err(|_| Error::Network(format!("{}: revalidation task dropped", request.url)))?
}
