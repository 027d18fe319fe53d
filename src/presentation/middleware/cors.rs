//! CORS Middleware Configuration

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsSettings;

/// Create CORS layer from settings.
///
/// Browsers do not apply CORS to WebSocket handshakes, so this only governs
/// the probe and metrics endpoints. `"*"` or an empty list allows any origin.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let allow_origin = match parse_origins(&settings.allowed_origins) {
        Some(origins) => AllowOrigin::list(origins),
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

/// Configured origins as header values. `None` means any origin.
fn parse_origins(configured: &[String]) -> Option<Vec<HeaderValue>> {
    if configured.is_empty() || configured.iter().any(|o| o == "*") {
        return None;
    }

    let origins = configured
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(origins)
}
