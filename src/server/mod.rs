//! HTTP server layer for the IIIF Image API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET {prefix}/{version}/{identifier}/.../{quality}.{format}    │
//! │                                                                 │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────┐   │
//! │  │          handlers           │  │        routes           │   │
//! │  │ (extract, decorated calls)  │  │ (router config, CORS)   │   │
//! │  └─────────────────────────────┘  └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    base_handler, health_handler, image_handler, info_document, info_handler, AppState,
    HealthResponse, IiifVersion, ImageApiEndpoint, ImagePathParams, InfoEndpoint, InfoPathParams,
    DEFAULT_CACHE_MAX_AGE,
};
pub use routes::{create_dev_router, create_router, RouterConfig, DEFAULT_API_PREFIX};
