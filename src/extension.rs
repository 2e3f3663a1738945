//! Extension state shared by the decorators.
//!
//! [`IiifExtension`] holds the three optional callbacks the hosting
//! application can register. It is built once at startup, wrapped in an
//! [`Arc`] and handed to each decorator when the decorator is constructed;
//! decorators only ever read it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use iiif_axum::{IiifExtension, ImageRequest};
//!
//! let extension: Arc<IiifExtension<ImageRequest>> = Arc::new(
//!     IiifExtension::new()
//!         .with_etag_callback(|req: &ImageRequest| Ok(Some(format!("{}-v1", req.identifier))))
//!         .with_api_decorator_callback(|req: &ImageRequest| {
//!             tracing::debug!(identifier = %req.identifier, "image requested");
//!             Ok(())
//!         }),
//! );
//! assert!(extension.etag_callback().is_some());
//! assert!(extension.last_modified_callback().is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::BoxError;
use crate::provider::ImageRequest;

/// Hook called before the decorated endpoint runs.
pub type ApiDecoratorCallback<A> = Arc<dyn Fn(&A) -> Result<(), BoxError> + Send + Sync>;

/// Produces the (unquoted) ETag for a call, or `None` when unknown.
pub type EtagCallback<A> = Arc<dyn Fn(&A) -> Result<Option<String>, BoxError> + Send + Sync>;

/// Produces the modification time for a call, or `None` when unknown.
pub type LastModifiedCallback<A> =
    Arc<dyn Fn(&A) -> Result<Option<DateTime<Utc>>, BoxError> + Send + Sync>;

/// Callback registry for the IIIF decorators.
///
/// `A` is the argument type of the decorated calls; for the image API it is
/// [`ImageRequest`].
pub struct IiifExtension<A = ImageRequest> {
    api_decorator_callback: Option<ApiDecoratorCallback<A>>,
    etag_callback: Option<EtagCallback<A>>,
    last_modified_callback: Option<LastModifiedCallback<A>>,
}

impl<A> IiifExtension<A> {
    /// Create an extension with no callbacks registered.
    pub fn new() -> Self {
        Self {
            api_decorator_callback: None,
            etag_callback: None,
            last_modified_callback: None,
        }
    }

    /// Register the pre-call hook.
    pub fn with_api_decorator_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&A) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.api_decorator_callback = Some(Arc::new(callback));
        self
    }

    /// Register the ETag callback. It must be deterministic for equal arguments.
    pub fn with_etag_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&A) -> Result<Option<String>, BoxError> + Send + Sync + 'static,
    {
        self.etag_callback = Some(Arc::new(callback));
        self
    }

    /// Register the Last-Modified callback.
    pub fn with_last_modified_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&A) -> Result<Option<DateTime<Utc>>, BoxError> + Send + Sync + 'static,
    {
        self.last_modified_callback = Some(Arc::new(callback));
        self
    }

    pub fn api_decorator_callback(&self) -> Option<&ApiDecoratorCallback<A>> {
        self.api_decorator_callback.as_ref()
    }

    pub fn etag_callback(&self) -> Option<&EtagCallback<A>> {
        self.etag_callback.as_ref()
    }

    pub fn last_modified_callback(&self) -> Option<&LastModifiedCallback<A>> {
        self.last_modified_callback.as_ref()
    }
}

impl<A> Default for IiifExtension<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for IiifExtension<A> {
    fn clone(&self) -> Self {
        Self {
            api_decorator_callback: self.api_decorator_callback.clone(),
            etag_callback: self.etag_callback.clone(),
            last_modified_callback: self.last_modified_callback.clone(),
        }
    }
}

impl<A> fmt::Debug for IiifExtension<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IiifExtension")
            .field(
                "api_decorator_callback",
                &self.api_decorator_callback.is_some(),
            )
            .field("etag_callback", &self.etag_callback.is_some())
            .field(
                "last_modified_callback",
                &self.last_modified_callback.is_some(),
            )
            .finish()
    }
}
