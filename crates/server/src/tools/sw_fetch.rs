//! sw_fetch tool implementation.
//!
//! Routes one request through the worker exactly as a page fetch would be.

use bistro_client::{FetchOutcome, Request, ResponseSource, ServiceWorker, fetch::resolve};
use bistro_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL or origin-relative path to request.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Accept header sent with the request.
    #[serde(default)]
    pub accept: Option<String>,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Whether the worker let the request go straight to the network.
    pub bypassed: bool,
    /// `network`, `cache` or `fallback`.
    pub source: String,
    /// Generation the response was read from, for cache hits.
    pub generation: Option<String>,
    pub body_len: usize,
    /// Body as text when the content type is textual.
    pub body: Option<String>,
}

fn is_textual(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct.starts_with("text/") || ct.contains("json") || ct.contains("xml") || ct.contains("javascript")
    })
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(worker.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::get(url);
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method)?;
    }
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_accept(accept)?;
    }

    let (response, bypassed) = match worker.handle_fetch(&request).await {
        FetchOutcome::Bypass => (worker.fetch(&request).await?, true),
        FetchOutcome::Respond(result) => (result?, false),
    };

    let (source, generation) = match &response.source {
        ResponseSource::Network => ("network", None),
        ResponseSource::Cache { generation } => ("cache", Some(generation.clone())),
        ResponseSource::Fallback => ("fallback", None),
    };
    let content_type = response.content_type().map(str::to_string);
    let body = is_textual(content_type.as_deref()).then(|| String::from_utf8_lossy(&response.body).into_owned());

    json_result(&SwFetchOutput {
        url: response.url.to_string(),
        status: response.status.as_u16(),
        content_type,
        bypassed,
        source: source.to_string(),
        generation,
        body_len: response.body.len(),
        body,
    })
}
