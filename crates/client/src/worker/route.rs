//! Request classification.
//!
//! Picks one caching strategy per intercepted request. Pattern lists are
//! matched by plain substring containment over the full URL, first match
//! wins: network-first patterns, then cache-first patterns, then HTML
//! navigations go stale-while-revalidate, everything else network-first.

use std::fmt;

use bistro_core::manifest::{CACHE_FIRST, NETWORK_FIRST};
use reqwest::Method;
use serde::Serialize;

use crate::fetch::{Request, is_extension_scheme};

/// Caching discipline applied to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        })
    }
}

/// Ordered pattern tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    network_first: Vec<String>,
    cache_first: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(NETWORK_FIRST.iter().copied(), CACHE_FIRST.iter().copied())
    }
}

impl RouteTable {
    pub fn new<N, C>(network_first: N, cache_first: C) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            network_first: network_first.into_iter().map(Into::into).collect(),
            cache_first: cache_first.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the worker handles this request at all.
    ///
    /// Non-GET methods and extension-scheme URLs go straight to the network.
    pub fn intercepts(request: &Request) -> bool {
        request.method == Method::GET && !is_extension_scheme(&request.url)
    }

    /// Choose the strategy for an intercepted request.
    pub fn classify(&self, request: &Request) -> Strategy {
        let url = request.url.as_str();

        if self.network_first.iter().any(|p| url.contains(p.as_str())) {
            Strategy::NetworkFirst
        } else if self.cache_first.iter().any(|p| url.contains(p.as_str())) {
            Strategy::CacheFirst
        } else if request.accepts_html() {
            Strategy::StaleWhileRevalidate
        } else {
            Strategy::NetworkFirst
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    fn html(url: &str) -> Request {
        get(url).with_accept("text/html,application/xhtml+xml").unwrap()
    }

    #[test]
    fn test_network_first_patterns() {
        let routes = RouteTable::default();
        assert_eq!(routes.classify(&html("https://bistro.example/reservations.html")), Strategy::NetworkFirst);
        assert_eq!(routes.classify(&get("https://bistro.example/api/menu")), Strategy::NetworkFirst);
        assert_eq!(routes.classify(&get("https://api.bistro.example/slots")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_cache_first_patterns() {
        let routes = RouteTable::default();
        assert_eq!(routes.classify(&get("https://bistro.example/css/style.css")), Strategy::CacheFirst);
        assert_eq!(routes.classify(&get("https://bistro.example/images/hero/hero.webp")), Strategy::CacheFirst);
        assert_eq!(routes.classify(&get("https://fonts.gstatic.com/s/inter.woff2")), Strategy::CacheFirst);
    }

    #[test]
    fn test_network_first_wins_over_cache_first() {
        let routes = RouteTable::default();
        assert_eq!(routes.classify(&get("https://bistro.example/api/images/1")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_html_is_stale_while_revalidate() {
        let routes = RouteTable::default();
        assert_eq!(routes.classify(&html("https://bistro.example/menu.html")), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn test_default_is_network_first() {
        let routes = RouteTable::default();
        assert_eq!(routes.classify(&get("https://bistro.example/manifest.json")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_substring_match_is_unanchored() {
        let routes = RouteTable::default();
        let req = html("https://bistro.example/menu.html?from=/css/");
        assert_eq!(routes.classify(&req), Strategy::CacheFirst);
    }

    #[test]
    fn test_intercepts() {
        assert!(RouteTable::intercepts(&get("https://bistro.example/")));

        let mut post = get("https://bistro.example/api/reservations");
        post.method = Method::POST;
        assert!(!RouteTable::intercepts(&post));

        assert!(!RouteTable::intercepts(&get("chrome-extension://abc/inject.js")));
    }

    #[test]
    fn test_custom_table() {
        let routes = RouteTable::new(["/live/"], ["/static/"]);
        assert_eq!(routes.classify(&get("https://x.example/live/feed")), Strategy::NetworkFirst);
        assert_eq!(routes.classify(&get("https://x.example/static/a.css")), Strategy::CacheFirst);
        assert_eq!(routes.classify(&get("https://x.example/css/a.css")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
    }
}
