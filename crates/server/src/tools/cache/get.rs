//! cache_get tool implementation.
//!
//! Looks a GET request up across all generations, the way the worker does.

use bistro_client::{ServiceWorker, fetch::resolve};
use bistro_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL or origin-relative path of the cached request.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub cache: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
}

pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(worker.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let entry = worker
        .storage()
        .match_any("GET", url.as_str())
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let response = entry.response;
    json_result(&CacheGetOutput {
        cache: entry.cache_name,
        url: response.url,
        status: response.status_code,
        stored_at: entry.stored_at,
        body_len: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
    })
}
