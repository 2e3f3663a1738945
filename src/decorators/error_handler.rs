//! Translation of image failures into HTTP error responses.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http::HeaderMap;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{HandlerError, ImageError};

use super::{Endpoint, HandlerResult};

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "crop_error", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code, repeated in the body
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: status.as_u16(),
        }
    }
}

/// Convert ImageError to HTTP response.
///
/// - processing failures (crop, resize, format, rotate, quality) → 500
/// - validation failures → 400
/// - domain and not-found failures → their embedded status code
impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.kind();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(error_type, message, status))).into_response()
    }
}

/// Decorator that turns [`ImageError`] failures of the wrapped endpoint into
/// error responses.
///
/// Successful results pass through untouched. Unclassified failures are not
/// caught and propagate to the caller.
#[derive(Debug, Clone)]
pub struct ErrorHandler<E> {
    inner: E,
}

impl<E> ErrorHandler<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A, E> Endpoint<A> for ErrorHandler<E>
where
    A: Send + Sync + 'static,
    E: Endpoint<A>,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult {
        match self.inner.call(args, headers).await {
            Ok(response) => Ok(response),
            Err(HandlerError::Image(err)) => Ok(err.into_response()),
            Err(err) => Err(err),
        }
    }
}
