//! # iiif-axum
//!
//! IIIF Image API endpoints for axum, with request decorators for error
//! translation, a pre-call hook and HTTP conditional GET.
//!
//! ## Features
//!
//! - **Error translation**: image processing and validation failures become
//!   HTTP responses with a JSON body and the right status code
//! - **Pre-call hook**: an application callback runs before every image call
//! - **Conditional GET**: ETag / Last-Modified validators and `304 Not Modified`
//! - **Filesystem provider**: serves images stored below a root directory
//!
//! ## Architecture
//!
//! - [`decorators`] - Endpoint trait and the composable decorators
//! - [`extension`] - Callback registry shared by the decorators
//! - [`provider`] - Image provider trait, filesystem provider and cache
//! - [`server`] - Axum handlers and router
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use iiif_axum::{create_router, FsImageProvider, IiifExtension, ImageRequest, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = FsImageProvider::new("/srv/images");
//!
//!     let etags = provider.clone();
//!     let extension = IiifExtension::new()
//!         .with_etag_callback(move |request: &ImageRequest| Ok(etags.etag(request)?));
//!
//!     let router = create_router(provider, extension, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod decorators;
pub mod error;
pub mod extension;
pub mod provider;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use decorators::{
    endpoint_fn, ApiHook, Endpoint, ErrorHandler, ErrorResponse, HandlerResult, HttpCache,
};
pub use error::{BoxError, HandlerError, ImageError};
pub use extension::{ApiDecoratorCallback, EtagCallback, IiifExtension, LastModifiedCallback};
pub use provider::{
    is_known_format, mime_type_for, FsImageProvider, ImageCache, ImageCacheKey, ImageInfo,
    ImageProvider, ImageRequest, InfoRequest, DEFAULT_IMAGE_CACHE_CAPACITY, IIIF_FORMATS,
};
pub use server::{create_dev_router, create_router, AppState, HealthResponse, RouterConfig};
