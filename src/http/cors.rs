//! Cross-origin policy for the browser client.
//!
//! The gateway sits in front of a single-page app served from another
//! origin, so every origin is mirrored back with credentials allowed.

use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Mirror origin, method and requested headers; allow cookies.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
