//! URL resolution for routing and cache identity.

use url::Url;

/// Schemes owned by browser extensions; the worker never touches them.
const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "safari-web-extension"];

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a manifest entry or request target against the site origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative paths onto `origin`; absolute URLs are kept
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// The scheme is not checked here so extension URLs can still be
/// recognized and passed through; see [`canonicalize`] for fetch targets.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Canonicalize a URL the fetch client is about to request.
///
/// Only `http` and `https` can go to the network. Hosts are lowercased by
/// the URL parser; the fragment is dropped.
pub fn canonicalize(url: &Url) -> Result<Url, UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    let mut parsed = url.clone();
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the URL belongs to a browser extension.
pub fn is_extension_scheme(url: &Url) -> bool {
    EXTENSION_SCHEMES.contains(&url.scheme())
}
