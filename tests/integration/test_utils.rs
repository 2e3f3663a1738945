//! Test utilities for integration tests.
//!
//! This module provides a mock image provider with call tracking and helpers
//! for building routers and requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use bytes::Bytes;

use iiif_axum::{
    create_router, IiifExtension, ImageError, ImageInfo, ImageProvider, ImageRequest,
    RouterConfig,
};

/// Prefix the default router mounts the IIIF routes under.
pub const PREFIX: &str = "/api/multimedia/image";

/// Payload every mock image renders to.
pub const IMAGE_BYTES: &[u8] = b"mock image bytes";

// =============================================================================
// Mock Image Provider
// =============================================================================

/// An image provider backed by in-memory data that counts render calls.
///
/// Identifiers registered with [`MockImageProvider::with_failure`] fail to
/// render with the given error.
#[derive(Clone)]
pub struct MockImageProvider {
    images: HashMap<String, ImageInfo>,
    failures: HashMap<String, ImageError>,
    render_count: Arc<AtomicUsize>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            failures: HashMap::new(),
            render_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_image(mut self, identifier: impl Into<String>, width: u32, height: u32) -> Self {
        self.images
            .insert(identifier.into(), ImageInfo { width, height });
        self
    }

    pub fn with_failure(mut self, identifier: impl Into<String>, error: ImageError) -> Self {
        let identifier = identifier.into();
        self.images.insert(
            identifier.clone(),
            ImageInfo {
                width: 1,
                height: 1,
            },
        );
        self.failures.insert(identifier, error);
        self
    }

    /// Shared handle to the render counter; survives moving the provider.
    pub fn render_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.render_count)
    }
}

impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn validate(&self, request: &ImageRequest) -> Result<(), ImageError> {
        if request.quality == "sepia" {
            return Err(ImageError::Validation(format!(
                "Invalid quality: {}",
                request.quality
            )));
        }
        Ok(())
    }

    async fn info(&self, identifier: &str) -> Result<ImageInfo, ImageError> {
        self.images
            .get(identifier)
            .copied()
            .ok_or_else(|| ImageError::not_found(format!("Image not found: {}", identifier)))
    }

    async fn render(&self, request: &ImageRequest) -> Result<Bytes, ImageError> {
        self.render_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failures.get(&request.identifier) {
            return Err(error.clone());
        }
        if !self.images.contains_key(&request.identifier) {
            return Err(ImageError::not_found(format!(
                "Image not found: {}",
                request.identifier
            )));
        }
        Ok(Bytes::from_static(IMAGE_BYTES))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Router with the given provider and callbacks and tracing disabled.
pub fn router_with(
    provider: MockImageProvider,
    extension: IiifExtension<ImageRequest>,
) -> Router {
    create_router(provider, extension, RouterConfig::new().with_tracing(false))
}

/// Extension whose ETag is `"{identifier}-v1"` for every request.
pub fn etag_extension() -> IiifExtension<ImageRequest> {
    IiifExtension::new()
        .with_etag_callback(|request: &ImageRequest| Ok(Some(format!("{}-v1", request.identifier))))
}

/// Full-image URI below the default prefix.
pub fn image_uri(identifier: &str, filename: &str) -> String {
    format!("{}/v2/{}/full/full/0/{}", PREFIX, identifier, filename)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_header(uri: &str, name: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}
