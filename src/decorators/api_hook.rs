//! Pre-call hook decorator.

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::HandlerError;
use crate::extension::IiifExtension;

use super::{Endpoint, HandlerResult};

/// Decorator that runs the extension's `api_decorator_callback` before the
/// wrapped endpoint.
///
/// The hook sees the same arguments as the endpoint. Its return value is
/// discarded; a hook failure is propagated as unclassified and the endpoint
/// is not called.
pub struct ApiHook<E, A> {
    inner: E,
    extension: Arc<IiifExtension<A>>,
}

impl<E, A> ApiHook<E, A> {
    pub fn new(inner: E, extension: Arc<IiifExtension<A>>) -> Self {
        Self { inner, extension }
    }
}

#[async_trait]
impl<A, E> Endpoint<A> for ApiHook<E, A>
where
    A: Send + Sync + 'static,
    E: Endpoint<A>,
{
    async fn call(&self, args: &A, headers: &HeaderMap) -> HandlerResult {
        if let Some(hook) = self.extension.api_decorator_callback() {
            hook(args).map_err(HandlerError::Unclassified)?;
        }
        self.inner.call(args, headers).await
    }
}
