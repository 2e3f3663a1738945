//! Router configuration for the IIIF image server.
//!
//! This module defines the HTTP routes and applies the CORS and tracing
//! middleware. The decorator chains themselves live in [`AppState`].
//!
//! # Route Structure
//!
//! ```text
//! /health                                                    - Health check
//! {prefix}/{version}/{identifier}                            - 303 to info.json
//! {prefix}/{version}/{identifier}/info.json                  - Image information
//! {prefix}/{version}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}
//!                                                            - Image API
//! ```
//!
//! # Example
//!
//! ```ignore
//! use iiif_axum::{create_router, FsImageProvider, IiifExtension, RouterConfig};
//!
//! let provider = FsImageProvider::new("/srv/images");
//! let config = RouterConfig::new()
//!     .with_api_prefix("/iiif")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(provider, IiifExtension::new(), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    base_handler, health_handler, image_handler, info_handler, AppState, DEFAULT_CACHE_MAX_AGE,
};
use crate::extension::IiifExtension;
use crate::provider::{ImageCache, ImageProvider, ImageRequest, DEFAULT_IMAGE_CACHE_CAPACITY};

/// Default mount point of the IIIF routes.
pub const DEFAULT_API_PREFIX: &str = "/api/multimedia/image";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Path the IIIF routes are mounted under (empty = root)
    pub api_prefix: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Capacity of the rendered image cache in bytes
    pub image_cache_capacity: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - Routes are mounted under `/api/multimedia/image`
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - The image cache holds 100MB
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            image_cache_capacity: DEFAULT_IMAGE_CACHE_CAPACITY,
            enable_tracing: true,
        }
    }

    /// Set the mount point. Trailing slashes are dropped and a leading one is added.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = normalize_prefix(&prefix.into());
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Set the image cache capacity in bytes.
    pub fn with_image_cache_capacity(mut self, bytes: usize) -> Self {
        self.image_cache_capacity = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The image route is decorated with conditional GET, the pre-call hook and
/// error translation (outermost first); the info route only translates
/// errors. `extension` supplies the callbacks for the image route.
pub fn create_router<P>(
    provider: P,
    extension: IiifExtension<ImageRequest>,
    config: RouterConfig,
) -> Router
where
    P: ImageProvider + 'static,
{
    let cache = Arc::new(ImageCache::with_capacity(config.image_cache_capacity));
    let app_state = AppState::with_cache(provider, extension, cache, config.cache_max_age);

    let cors = build_cors_layer(&config);

    let iiif_routes = Router::new()
        .route("/{version}/{identifier}", get(base_handler))
        .route("/{version}/{identifier}/info.json", get(info_handler))
        .route(
            "/{version}/{identifier}/{region}/{size}/{rotation}/{filename}",
            get(image_handler),
        )
        .with_state(app_state);

    let router = Router::new().route("/health", get(health_handler));
    let router = if config.api_prefix.is_empty() {
        router.merge(iiif_routes)
    } else {
        router.nest(&config.api_prefix, iiif_routes)
    };
    let router = router.layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, IF_NONE_MATCH, IF_MODIFIED_SINCE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

/// Create a router with default configuration and no callbacks.
pub fn create_dev_router<P>(provider: P) -> Router
where
    P: ImageProvider + 'static,
{
    create_router(provider, IiifExtension::new(), RouterConfig::new())
}

// =============================================================================
// Tests
// =============================================================================
