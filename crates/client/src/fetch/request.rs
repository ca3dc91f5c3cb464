//! Requests as seen by the worker.

use bistro_core::Error;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

/// An outbound request intercepted from the page.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    /// A GET request with no headers.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, headers: HeaderMap::new(), body: None }
    }

    /// A JSON POST request.
    pub fn post_json(url: Url, data: &serde_json::Value) -> Result<Self, Error> {
        let body = serde_json::to_vec(data)?;
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self { method: Method::POST, url, headers, body: Some(Bytes::from(body)) })
    }

    /// Replace the method, parsed case-insensitively.
    pub fn with_method(mut self, method: &str) -> Result<Self, Error> {
        self.method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {method:?}: {e}")))?;
        Ok(self)
    }

    /// Set the `Accept` header.
    pub fn with_accept(mut self, accept: &str) -> Result<Self, Error> {
        let value = HeaderValue::from_str(accept)
            .map_err(|e| Error::InvalidInput(format!("invalid Accept header: {e}")))?;
        self.headers.insert(header::ACCEPT, value);
        Ok(self)
    }

    /// The `Accept` header, or the empty string when absent.
    pub fn accept(&self) -> &str {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Whether the page expects an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept().contains("text/html")
    }

    /// Whether the page expects an image.
    pub fn accepts_image(&self) -> bool {
        self.accept().contains("image")
    }

    /// URL used as cache identity (no fragment).
    pub fn cache_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_accept_missing_is_empty() {
        let req = Request::get(url("https://example.com/"));
        assert_eq!(req.accept(), "");
        assert!(!req.accepts_html());
        assert!(!req.accepts_image());
    }

    #[test]
    fn test_accepts_html() {
        let req = Request::get(url("https://example.com/menu.html"))
            .with_accept("text/html,application/xhtml+xml,*/*;q=0.8")
            .unwrap();
        assert!(req.accepts_html());
        assert!(!req.accepts_image());
    }

    #[test]
    fn test_accepts_image() {
        let req = Request::get(url("https://example.com/images/hero/hero.webp"))
            .with_accept("image/avif,image/webp,*/*")
            .unwrap();
        assert!(req.accepts_image());
    }

    #[test]
    fn test_cache_url_drops_fragment() {
        let req = Request::get(url("https://example.com/menu.html#mains"));
        assert_eq!(req.cache_url(), "https://example.com/menu.html");
    }

    #[test]
    fn test_with_method() {
        let req = Request::get(url("https://example.com/")).with_method("delete").unwrap();
        assert_eq!(req.method, Method::DELETE);
        assert!(Request::get(url("https://example.com/")).with_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_post_json() {
        let req = Request::post_json(url("https://example.com/api/reservations"), &serde_json::json!({"guests": 2}))
            .unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(req.body.as_deref(), Some(br#"{"guests":2}"#.as_slice()));
    }
}
