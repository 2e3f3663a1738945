//! Request decorators for the IIIF Image API.
//!
//! Each decorator wraps an [`Endpoint`] and is itself an [`Endpoint`], so
//! decorators compose by nesting. The outermost decorator runs first.
//!
//! ```text
//!   request ──► HttpCache ──► ApiHook ──► ErrorHandler ──► endpoint
//!                  │              │             │
//!                  │              │             └─ ImageError → HTTP response
//!                  │              └─ api_decorator_callback(args)
//!                  └─ ETag / Last-Modified, 304 short-circuit
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use axum::response::IntoResponse;
//! use http::HeaderMap;
//! use iiif_axum::decorators::{endpoint_fn, ApiHook, Endpoint, ErrorHandler, HttpCache};
//! use iiif_axum::{HandlerError, IiifExtension, ImageError};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let extension = Arc::new(
//!     IiifExtension::<String>::new().with_etag_callback(|id: &String| Ok(Some(id.clone()))),
//! );
//!
//! let handler = endpoint_fn(|id: String, _headers: HeaderMap| async move {
//!     if id == "missing" {
//!         return Err(HandlerError::from(ImageError::not_found("no such image")));
//!     }
//!     Ok("image bytes".into_response())
//! });
//!
//! let decorated = HttpCache::new(
//!     ApiHook::new(ErrorHandler::new(handler), extension.clone()),
//!     extension,
//! );
//!
//! let response = decorated.call(&"missing".to_string(), &HeaderMap::new()).await.unwrap();
//! assert_eq!(response.status(), 404);
//! # }
//! ```

mod api_hook;
mod conditional;
mod error_handler;
mod http_cache;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use http::HeaderMap;

use crate::error::HandlerError;

pub use api_hook::ApiHook;
pub use conditional::{
    etag_matches, format_http_date, is_not_modified, parse_http_date, quote_etag, unquote_etag,
    Validators,
};
pub use error_handler::{ErrorHandler, ErrorResponse};
pub use http_cache::HttpCache;

/// Result of a decorated call.
pub type HandlerResult = Result<Response, HandlerError>;

/// A request-handling operation that decorators can wrap.
///
/// `args` are the call's arguments (for the image API, an
/// [`ImageRequest`](crate::ImageRequest)); `headers` are the incoming request
/// headers.
#[async_trait]
pub trait Endpoint<A>: Send + Sync
where
    A: Send + Sync + 'static,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult;
}

#[async_trait]
impl<A, E> Endpoint<A> for Arc<E>
where
    A: Send + Sync + 'static,
    E: Endpoint<A> + ?Sized,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult {
        (**self).call(args, headers).await
    }
}

/// Endpoint backed by an async closure. See [`endpoint_fn`].
#[derive(Clone)]
pub struct FnEndpoint<F> {
    f: F,
}

/// Turn an async closure taking owned arguments and headers into an [`Endpoint`].
pub fn endpoint_fn<F>(f: F) -> FnEndpoint<F> {
    FnEndpoint { f }
}

#[async_trait]
impl<A, F, Fut> Endpoint<A> for FnEndpoint<F>
where
    A: Clone + Send + Sync + 'static,
    F: Fn(A, HeaderMap) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult {
        (self.f)(args.clone(), headers.clone()).await
    }
}
