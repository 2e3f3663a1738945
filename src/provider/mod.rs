//! Image collaborator abstraction.
//!
//! The decorators never touch pixels. Everything that does (validating the
//! request, reading dimensions, producing the requested representation) sits
//! behind [`ImageProvider`], and reports failures through
//! [`ImageError`](crate::ImageError).
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Decorated IIIF endpoints         │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   ImageCache    │    │  ImageProvider      │
//! │ (rendered bytes │    │  (validate, info,   │
//! │  and info dims) │    │   render)           │
//! └─────────────────┘    └──────────┬──────────┘
//!                                   ▼
//!                        ┌─────────────────────┐
//!                        │  FsImageProvider    │
//!                        └─────────────────────┘
//! ```

mod cache;
mod fs_source;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ImageError;

pub(crate) use cache::{decode_info, encode_info};
pub use cache::{ImageCache, ImageCacheKey, DEFAULT_IMAGE_CACHE_CAPACITY};
pub use fs_source::FsImageProvider;

/// Output formats and their MIME types.
pub const IIIF_FORMATS: &[(&str, &str)] = &[
    ("gif", "image/gif"),
    ("jp2", "image/jp2"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
];

/// MIME type for a requested format; unknown formats are served as JPEG.
pub fn mime_type_for(format: &str) -> &'static str {
    IIIF_FORMATS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(format))
        .map(|(_, mime)| *mime)
        .unwrap_or("image/jpeg")
}

pub fn is_known_format(format: &str) -> bool {
    IIIF_FORMATS
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(format))
}

// =============================================================================
// Request Types
// =============================================================================

/// Arguments of an image API call.
///
/// `/{version}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}`
///
/// The region, size and rotation values are kept verbatim; interpreting them
/// is the provider's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRequest {
    pub version: String,
    pub identifier: String,
    pub region: String,
    pub size: String,
    pub rotation: String,
    pub quality: String,
    pub format: String,
}

impl ImageRequest {
    /// Request for the whole image, unscaled and unrotated, in `format`.
    pub fn full(
        version: impl Into<String>,
        identifier: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            identifier: identifier.into(),
            region: "full".to_string(),
            size: "full".to_string(),
            rotation: "0".to_string(),
            quality: "default".to_string(),
            format: format.into(),
        }
    }

    /// Split a `{quality}.{format}` path segment.
    ///
    /// Returns `None` when there is no `.` or either side is empty.
    pub fn split_filename(filename: &str) -> Option<(&str, &str)> {
        let (quality, format) = filename.rsplit_once('.')?;
        if quality.is_empty() || format.is_empty() {
            return None;
        }
        Some((quality, format))
    }
}

/// Arguments of an info call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRequest {
    pub version: String,
    pub identifier: String,

    /// Absolute URI of the image, used as the `@id` of the info document
    pub base_uri: String,
}

/// Pixel dimensions of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// ImageProvider Trait
// =============================================================================

/// Source of images and of everything that transforms them.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Check request parameters before any work is done.
    fn validate(&self, _request: &ImageRequest) -> Result<(), ImageError> {
        Ok(())
    }

    /// Dimensions of the source image.
    async fn info(&self, identifier: &str) -> Result<ImageInfo, ImageError>;

    /// Produce the encoded representation described by `request`.
    async fn render(&self, request: &ImageRequest) -> Result<Bytes, ImageError>;
}
