//! CORS layer for the webhook endpoint.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Builds the CORS layer from an origin allow-list.
///
/// An empty list mirrors the caller's `Origin` back, so browser-based tools
/// can still post test events. Entries that are not valid header values are
/// skipped with a warning; a list with no valid entry allows no origin.
pub fn build_cors(origins: &[String]) -> CorsLayer {
    let configured: Vec<&str> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .collect();

    let allow_origin = if configured.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let allowed: Vec<HeaderValue> = configured
            .into_iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        if allowed.is_empty() {
            tracing::warn!("No valid CORS origin configured, cross-origin requests are refused");
        }
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
