//! HTTP request handlers for the IIIF Image API.
//!
//! # Endpoints
//!
//! - `GET /{version}/{identifier}` - Redirect to the info document
//! - `GET /{version}/{identifier}/info.json` - Image information
//! - `GET /{version}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}` - Image
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{OriginalUri, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::decorators::{ApiHook, Endpoint, ErrorHandler, ErrorResponse, HandlerResult, HttpCache};
use crate::error::{HandlerError, ImageError};
use crate::extension::IiifExtension;
use crate::provider::{
    decode_info, encode_info, mime_type_for, ImageCache, ImageCacheKey, ImageInfo, ImageProvider,
    ImageRequest, InfoRequest,
};

/// Default Cache-Control max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Tile edge advertised in info documents.
const TILE_SIZE: u32 = 256;

/// Scale factors advertised in info documents.
const SCALE_FACTORS: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

// =============================================================================
// Application State
// =============================================================================

/// Shared application state holding the decorated endpoints.
///
/// The decorator chain is assembled once here; handlers only dispatch to it.
#[derive(Clone)]
pub struct AppState {
    /// Image API: HttpCache → ApiHook → ErrorHandler → ImageApiEndpoint
    pub image_api: Arc<dyn Endpoint<ImageRequest>>,

    /// Info document: ErrorHandler → InfoEndpoint
    pub info_api: Arc<dyn Endpoint<InfoRequest>>,
}

impl AppState {
    /// Create application state with a fresh default-sized image cache.
    pub fn new<P>(provider: P, extension: IiifExtension<ImageRequest>) -> Self
    where
        P: ImageProvider + 'static,
    {
        Self::with_cache(
            provider,
            extension,
            Arc::new(ImageCache::new()),
            DEFAULT_CACHE_MAX_AGE,
        )
    }

    /// Create application state with an explicit cache and max-age.
    pub fn with_cache<P>(
        provider: P,
        extension: IiifExtension<ImageRequest>,
        cache: Arc<ImageCache>,
        cache_max_age: u32,
    ) -> Self
    where
        P: ImageProvider + 'static,
    {
        let provider = Arc::new(provider);
        let extension = Arc::new(extension);

        let image_endpoint = ImageApiEndpoint {
            provider: Arc::clone(&provider),
            cache: Arc::clone(&cache),
            cache_max_age,
        };
        let image_api = HttpCache::new(
            ApiHook::new(ErrorHandler::new(image_endpoint), Arc::clone(&extension)),
            extension,
        );

        let info_api = ErrorHandler::new(InfoEndpoint { provider, cache });

        Self {
            image_api: Arc::new(image_api),
            info_api: Arc::new(info_api),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for image requests.
///
/// Extracted from: `/{version}/{identifier}/{region}/{size}/{rotation}/{filename}`
/// where filename is `{quality}.{format}`
#[derive(Debug, Deserialize)]
pub struct ImagePathParams {
    pub version: String,
    pub identifier: String,
    pub region: String,
    pub size: String,
    pub rotation: String,
    pub filename: String,
}

impl ImagePathParams {
    /// Build the image request, failing when the filename has no format.
    pub fn into_request(self) -> Result<ImageRequest, ImageError> {
        let (quality, format) = ImageRequest::split_filename(&self.filename).ok_or_else(|| {
            ImageError::not_found(format!("No image format in {}", self.filename))
        })?;
        let (quality, format) = (quality.to_string(), format.to_string());

        Ok(ImageRequest {
            version: self.version,
            identifier: self.identifier,
            region: self.region,
            size: self.size,
            rotation: self.rotation,
            quality,
            format,
        })
    }
}

/// Path parameters for info and base requests.
#[derive(Debug, Deserialize)]
pub struct InfoPathParams {
    pub version: String,
    pub identifier: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Uncaught failures end up here, answered the way any unhandled fault is.
impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        error!(error = %self, "Unhandled error while serving request");

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = ErrorResponse::new("internal_error", "Internal server error", status);
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Endpoints
// =============================================================================

/// The undecorated image API operation.
pub struct ImageApiEndpoint<P> {
    provider: Arc<P>,
    cache: Arc<ImageCache>,
    cache_max_age: u32,
}

#[async_trait]
impl<P: ImageProvider> Endpoint<ImageRequest> for ImageApiEndpoint<P> {
    async fn call(&self, request: &ImageRequest, _headers: &HeaderMap) -> HandlerResult {
        debug!(
            version = %request.version,
            identifier = %request.identifier,
            region = %request.region,
            size = %request.size,
            rotation = %request.rotation,
            quality = %request.quality,
            format = %request.format,
            "Processing image request"
        );

        self.provider.validate(request)?;

        let key = ImageCacheKey::image(request);
        let (data, cache_hit) = match self.cache.get(&key).await {
            Some(data) => (data, true),
            None => {
                let data = self.provider.render(request).await?;
                self.cache.put(key, data.clone()).await;
                (data, false)
            }
        };

        let mime_type = mime_type_for(&request.format);
        debug!(
            mime_type = mime_type,
            bytes = data.len(),
            cache_hit = cache_hit,
            "Processed image request"
        );

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_type)
            .header(
                header::CACHE_CONTROL,
                format!("public, max-age={}", self.cache_max_age),
            )
            .header("X-Image-Cache-Hit", cache_hit.to_string())
            .body(Body::from(data))
            .map_err(HandlerError::unclassified)
    }
}

/// The undecorated info document operation.
pub struct InfoEndpoint<P> {
    provider: Arc<P>,
    cache: Arc<ImageCache>,
}

#[async_trait]
impl<P: ImageProvider> Endpoint<InfoRequest> for InfoEndpoint<P> {
    async fn call(&self, request: &InfoRequest, _headers: &HeaderMap) -> HandlerResult {
        let version = IiifVersion::parse(&request.version)?;

        let key = ImageCacheKey::info(&request.version, &request.identifier);
        let info = match self.cache.get(&key).await.as_deref().and_then(decode_info) {
            Some(info) => info,
            None => {
                let info = self.provider.info(&request.identifier).await?;
                self.cache.put(key, encode_info(info)).await;
                info
            }
        };

        Ok(Json(info_document(version, &request.base_uri, info)).into_response())
    }
}

/// Image API versions with an info document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IiifVersion {
    V1,
    V2,
}

impl IiifVersion {
    /// Parse a `v1` / `v2` path segment; anything else fails validation.
    pub fn parse(version: &str) -> Result<Self, ImageError> {
        match version {
            "v1" => Ok(IiifVersion::V1),
            "v2" => Ok(IiifVersion::V2),
            other => Err(ImageError::Validation(format!(
                "Unsupported IIIF version: {}",
                other
            ))),
        }
    }
}

/// Build the info document for a version.
pub fn info_document(version: IiifVersion, id: &str, info: ImageInfo) -> Value {
    match version {
        IiifVersion::V1 => json!({
            "@context": "http://library.stanford.edu/iiif/image-api/1.1/context.json",
            "@id": id,
            "width": info.width,
            "height": info.height,
            "profile": "http://library.stanford.edu/iiif/image-api/compliance.html#level1",
            "tile_width": TILE_SIZE,
            "tile_height": TILE_SIZE,
            "scale_factors": SCALE_FACTORS,
        }),
        IiifVersion::V2 => json!({
            "@context": "http://iiif.io/api/image/2/context.json",
            "@id": id,
            "protocol": "http://iiif.io/api/image",
            "width": info.width,
            "height": info.height,
            "tiles": [{"width": TILE_SIZE, "scaleFactors": SCALE_FACTORS}],
            "profile": ["http://iiif.io/api/image/2/level2.json"],
        }),
    }
}

/// Absolute URI of the image base from the request's host and path.
fn base_uri(headers: &HeaderMap, path: &str) -> String {
    let path = path.trim_end_matches('/').trim_end_matches("/info.json");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    match host {
        Some(host) => format!("{}://{}{}", scheme, host, path),
        None => path.to_string(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image requests.
///
/// # Endpoint
///
/// `GET /{version}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}`
///
/// # Response
///
/// - `200 OK`: image bytes, `Content-Type` from the format
/// - `304 Not Modified`: client copy is current (ETag / Last-Modified)
/// - `400 Bad Request`: validation failure
/// - `404 Not Found`: unknown image
/// - `500 Internal Server Error`: processing failure or unhandled error
pub async fn image_handler(
    State(state): State<AppState>,
    Path(params): Path<ImagePathParams>,
    headers: HeaderMap,
) -> HandlerResult {
    let request = match params.into_request() {
        Ok(request) => request,
        Err(err) => return Ok(err.into_response()),
    };
    state.image_api.call(&request, &headers).await
}

/// Handle info requests.
///
/// # Endpoint
///
/// `GET /{version}/{identifier}/info.json`
pub async fn info_handler(
    State(state): State<AppState>,
    Path(params): Path<InfoPathParams>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> HandlerResult {
    let request = InfoRequest {
        base_uri: base_uri(&headers, uri.path()),
        version: params.version,
        identifier: params.identifier,
    };
    state.info_api.call(&request, &headers).await
}

/// Redirect the image base URI to its info document with `303 See Other`.
pub async fn base_handler(OriginalUri(uri): OriginalUri) -> Redirect {
    let location = format!("{}/info.json", uri.path().trim_end_matches('/'));
    Redirect::to(&location)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
