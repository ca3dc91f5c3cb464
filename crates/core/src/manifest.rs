//! Deploy-time constants for the worker.
//!
//! Generation names carry the release version; bumping [`CACHE_VERSION`]
//! makes every older generation garbage at the next activation.

macro_rules! cache_version {
    () => {
        "v1.0.0"
    };
}

/// Release stamp shared by both current generations.
pub const CACHE_VERSION: &str = cache_version!();

/// Pre-populated, read-only generation.
pub const STATIC_CACHE: &str = concat!("bistrodelight-static-", cache_version!());

/// Lazily populated generation for runtime responses.
pub const DYNAMIC_CACHE: &str = concat!("bistrodelight-dynamic-", cache_version!());

/// Files fetched into the static generation at install time.
///
/// Paths are resolved against the configured site origin; absolute URLs are
/// fetched as-is.
pub const STATIC_FILES: &[&str] = &[
    "/",
    "/index.html",
    "/about.html",
    "/menu.html",
    "/gallery.html",
    "/contact.html",
    "/reservations.html",
    "/css/style.css",
    "/css/responsive.css",
    "/js/main.js",
    "/js/reservations.js",
    "/manifest.json",
    "/images/hero/hero.webp",
    "/images/hero/hero2.webp",
    "/images/hero/hero3.webp",
    "/images/hero/hero4.webp",
    "https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;700&family=Inter:wght@300;400;500;600&display=swap",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
];

/// URL substrings that always try the network first.
pub const NETWORK_FIRST: &[&str] = &["/reservations.html", "/api/", "https://api."];

/// URL substrings served from cache when available.
pub const CACHE_FIRST: &[&str] = &[
    "/images/",
    "/css/",
    "/js/",
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
    "https://cdnjs.cloudflare.com",
];

/// Cached page served to offline navigations, if present.
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Background sync tag for offline reservations.
pub const RESERVATION_SYNC_TAG: &str = "reservation-sync";

/// Endpoint receiving synced reservations.
pub const RESERVATIONS_ENDPOINT: &str = "/api/reservations";

/// Whether a generation name belongs to the current release.
pub fn is_current_generation(name: &str) -> bool {
    name == STATIC_CACHE || name == DYNAMIC_CACHE
}
