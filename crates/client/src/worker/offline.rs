//! Responses for when neither network nor cache can answer.

use bistro_core::manifest::OFFLINE_PAGE;
use bistro_core::{CacheDb, Error};
use reqwest::Method;
use url::Url;

use crate::fetch::{Request, Response, ResponseSource, resolve};

/// Inline page for offline navigations without a cached offline page.
pub const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>BistroDelight - Offline</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
        .offline-message { max-width: 400px; margin: 0 auto; }
        .icon { font-size: 64px; color: #C9A961; margin-bottom: 20px; }
    </style>
</head>
<body>
    <div class="offline-message">
        <div class="icon">🍽️</div>
        <h1>You're Offline</h1>
        <p>Please check your internet connection and try again.</p>
        <button onclick="location.reload()">Retry</button>
    </div>
</body>
</html>
"#;

/// 200x150 placeholder for images that could not be loaded.
pub const IMAGE_PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="150" viewBox="0 0 200 150"><rect width="200" height="150" fill="#f0f0f0"/><text x="100" y="75" text-anchor="middle" fill="#999">Image Unavailable</text></svg>"##;

/// Build the fallback for a request the strategies could not satisfy.
///
/// HTML gets the cached offline page or the inline one; images get the SVG
/// placeholder; anything else is a terminal [`Error::Offline`].
pub(crate) async fn offline_response(storage: &CacheDb, origin: &Url, request: &Request) -> Result<Response, Error> {
    if request.accepts_html() {
        let page = resolve(origin, OFFLINE_PAGE).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        match storage.match_any(Method::GET.as_str(), page.as_str()).await {
            Ok(Some(entry)) => {
                let mut response = Response::from_entry(entry)?;
                response.source = ResponseSource::Fallback;
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "offline page lookup failed"),
        }
        return Ok(Response::synthesized(request.url.clone(), "text/html", OFFLINE_HTML));
    }

    if request.accepts_image() {
        return Ok(Response::synthesized(request.url.clone(), "image/svg+xml", IMAGE_PLACEHOLDER_SVG));
    }

    Err(Error::Offline(format!("{}: network error and no cached version available", request.url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::CachedResponse;
    use reqwest::StatusCode;

    fn origin() -> Url {
        Url::parse("https://bistro.example/").unwrap()
    }

    fn request(path: &str, accept: &str) -> Request {
        Request::get(origin().join(path).unwrap()).with_accept(accept).unwrap()
    }

    #[tokio::test]
    async fn test_html_inline_page() {
        let storage = CacheDb::open_in_memory().await.unwrap();
        let response = offline_response(&storage, &origin(), &request("/menu.html", "text/html"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("text/html"));
        let body = String::from_utf8_lossy(&response.body);
        assert!(body.contains("You're Offline"));
        assert!(body.contains("Retry"));
    }

    #[tokio::test]
    async fn test_html_prefers_cached_offline_page() {
        let storage = CacheDb::open_in_memory().await.unwrap();
        let cache = storage.open_cache("static").await.unwrap();
        cache
            .put(&CachedResponse {
                method: "GET".into(),
                url: "https://bistro.example/offline.html".into(),
                status_code: 200,
                headers: vec![("content-type".into(), "text/html".into())],
                body: b"<p>custom offline</p>".to_vec(),
            })
            .await
            .unwrap();

        let response = offline_response(&storage, &origin(), &request("/gallery.html", "text/html"))
            .await
            .unwrap();
        assert_eq!(&response.body[..], b"<p>custom offline</p>");
        assert_eq!(response.source, ResponseSource::Fallback);
    }

    #[tokio::test]
    async fn test_image_placeholder() {
        let storage = CacheDb::open_in_memory().await.unwrap();
        let response = offline_response(&storage, &origin(), &request("/images/dish.webp", "image/webp,*/*"))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("image/svg+xml"));
        let body = String::from_utf8_lossy(&response.body);
        assert!(body.contains("Image Unavailable"));
        assert!(body.contains(r#"width="200" height="150""#));
    }

    #[tokio::test]
    async fn test_other_content_is_terminal() {
        let storage = CacheDb::open_in_memory().await.unwrap();
        let result = offline_response(&storage, &origin(), &request("/js/main.js", "*/*")).await;
        assert!(matches!(result, Err(Error::Offline(_))));
    }
}
