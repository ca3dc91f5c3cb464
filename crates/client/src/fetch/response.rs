//! Responses handed back to the page.

use bistro_core::{CacheEntry, CachedResponse, Error};
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

/// Where a response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Read from a cache generation.
    Cache { generation: String },
    /// Synthesized or cached offline content.
    Fallback,
}

/// A response snapshot: status, headers, body.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// A network response assembled by a non-reqwest [`Fetcher`](super::Fetcher).
    pub fn from_parts(url: Url, status: u16, content_type: &str, body: impl Into<Bytes>) -> Result<Self, Error> {
        let status =
            StatusCode::from_u16(status).map_err(|e| Error::InvalidInput(format!("status {status}: {e}")))?;
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(content_type)
            .map_err(|e| Error::InvalidInput(format!("content type {content_type:?}: {e}")))?;
        headers.insert(header::CONTENT_TYPE, value);
        Ok(Self { url, status, headers, body: body.into(), source: ResponseSource::Network })
    }

    /// A status-200 response built in the worker.
    pub fn synthesized(url: Url, content_type: &'static str, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self { url, status: StatusCode::OK, headers, body: Bytes::from_static(body.as_bytes()), source: ResponseSource::Fallback }
    }

    /// Copy for storage under the given request identity.
    ///
    /// Header values that are not visible ASCII are not kept.
    pub fn to_cached(&self, method: &str, cache_url: &str) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        CachedResponse {
            method: method.to_string(),
            url: cache_url.to_string(),
            status_code: self.status.as_u16(),
            headers,
            body: self.body.to_vec(),
        }
    }

    /// Rebuild a response from a stored entry.
    pub fn from_entry(entry: CacheEntry) -> Result<Self, Error> {
        let CacheEntry { cache_name, response, .. } = entry;
        let url = Url::parse(&response.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", response.url)))?;
        let status = StatusCode::from_u16(response.status_code)
            .map_err(|e| Error::InvalidInput(format!("stored status {}: {e}", response.status_code)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &response.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, url = %url, "skipping unparsable stored header"),
            }
        }

        Ok(Self {
            url,
            status,
            headers,
            body: Bytes::from(response.body),
            source: ResponseSource::Cache { generation: cache_name },
        })
    }
}
