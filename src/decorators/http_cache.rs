//! Conditional GET decorator (ETag / Last-Modified).

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http::HeaderMap;
use tracing::debug;

use crate::error::HandlerError;
use crate::extension::IiifExtension;

use super::conditional::{is_not_modified, Validators};
use super::{Endpoint, HandlerResult};

/// Decorator implementing HTTP conditional GET around an endpoint.
///
/// The extension's `etag_callback` and `last_modified_callback` are called
/// with the request arguments. When neither yields a value the endpoint is
/// called directly. Otherwise a fresh client copy short-circuits to
/// `304 Not Modified` without calling the endpoint, and a stale one gets the
/// endpoint's response with `ETag` / `Last-Modified` attached.
pub struct HttpCache<E, A> {
    inner: E,
    extension: Arc<IiifExtension<A>>,
}

impl<E, A> HttpCache<E, A> {
    pub fn new(inner: E, extension: Arc<IiifExtension<A>>) -> Self {
        Self { inner, extension }
    }
}

#[async_trait]
impl<A, E> Endpoint<A> for HttpCache<E, A>
where
    A: Send + Sync + 'static,
    E: Endpoint<A>,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult {
        let etag = match self.extension.etag_callback() {
            Some(callback) => callback(args)
                .map_err(HandlerError::Unclassified)?
                .filter(|etag| !etag.is_empty()),
            None => None,
        };

        let last_modified = match self.extension.last_modified_callback() {
            Some(callback) => callback(args).map_err(HandlerError::Unclassified)?,
            None => None,
        };

        if etag.is_none() && last_modified.is_none() {
            return self.inner.call(args, headers).await;
        }

        let validators =
            Validators::new(etag.as_deref(), last_modified).map_err(HandlerError::unclassified)?;

        if is_not_modified(headers, etag.as_deref(), last_modified) {
            debug!(etag = ?etag, last_modified = ?last_modified, "Client copy is fresh");
            let mut response: Response = StatusCode::NOT_MODIFIED.into_response();
            validators.apply(response.headers_mut());
            return Ok(response);
        }

        let mut response = self.inner.call(args, headers).await?;
        // Error responses from inner decorators must not advertise validators
        if response.status().is_success() {
            validators.apply(response.headers_mut());
        }
        Ok(response)
    }
}
