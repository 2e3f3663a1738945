//! Filesystem-backed image provider.
//!
//! Identifiers are paths relative to a root directory. The provider serves
//! source files as they are stored: any request that would need cropping,
//! scaling, rotation, a quality conversion or a format conversion is answered
//! with the corresponding processing failure.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ImageError;
use crate::extension::IiifExtension;

use super::{is_known_format, ImageInfo, ImageProvider, ImageRequest};

/// Quality keywords across IIIF 1.x and 2.x.
const QUALITIES: &[&str] = &["default", "native", "color", "gray", "grey", "bitonal"];

/// Qualities that leave the pixels untouched.
const IDENTITY_QUALITIES: &[&str] = &["default", "native", "color"];

/// Serves images from a local directory.
///
/// # Example
///
/// ```ignore
/// use iiif_axum::FsImageProvider;
///
/// let provider = FsImageProvider::new("/srv/images");
///
/// // The identifier "collections/cat.png" becomes /srv/images/collections/cat.png
/// let info = provider.info("collections/cat.png").await?;
/// ```
#[derive(Debug, Clone)]
pub struct FsImageProvider {
    root: PathBuf,
}

impl FsImageProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an identifier to a file below the root.
    ///
    /// Absolute identifiers and identifiers with `..` or `.` components are
    /// rejected as not found, as are identifiers that do not name a file.
    pub fn resolve(&self, identifier: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(identifier);
        let is_plain = !identifier.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(ImageError::not_found(format!(
                "Image not found: {}",
                identifier
            )));
        }

        let path = self.root.join(relative);
        if !path.is_file() {
            return Err(ImageError::not_found(format!(
                "Image not found: {}",
                identifier
            )));
        }
        Ok(path)
    }

    /// ETag for a request: a digest of the file's size and modification time
    /// together with every request parameter.
    ///
    /// Returns `Ok(None)` when the image does not exist.
    ///
    /// Performs blocking filesystem calls; from async code run it through
    /// `tokio::task::block_in_place` or `spawn_blocking`, as
    /// [`FsImageProvider::register_validators`] does.
    pub fn etag(&self, request: &ImageRequest) -> io::Result<Option<String>> {
        let Ok(path) = self.resolve(&request.identifier) else {
            return Ok(None);
        };
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(metadata.len().to_le_bytes());
        hasher.update(modified.as_nanos().to_le_bytes());
        for part in [
            &request.identifier,
            &request.region,
            &request.size,
            &request.rotation,
            &request.quality,
            &request.format,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }

        let digest = hex::encode(hasher.finalize());
        Ok(Some(digest[..32].to_string()))
    }

    /// Modification time of the image file, `Ok(None)` when it does not exist.
    ///
    /// Blocking, like [`FsImageProvider::etag`].
    pub fn last_modified(&self, identifier: &str) -> io::Result<Option<DateTime<Utc>>> {
        let Ok(path) = self.resolve(identifier) else {
            return Ok(None);
        };
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}

impl FsImageProvider {
    /// Register ETag and Last-Modified callbacks backed by this provider.
    ///
    /// The callbacks stat the file inside `tokio::task::block_in_place`, so
    /// they must run on the multi-threaded runtime.
    pub fn register_validators(
        &self,
        extension: IiifExtension<ImageRequest>,
    ) -> IiifExtension<ImageRequest> {
        let etags = self.clone();
        let dates = self.clone();
        extension
            .with_etag_callback(move |request: &ImageRequest| {
                tokio::task::block_in_place(|| etags.etag(request)).map_err(Into::into)
            })
            .with_last_modified_callback(move |request: &ImageRequest| {
                tokio::task::block_in_place(|| dates.last_modified(&request.identifier))
                    .map_err(Into::into)
            })
    }
}

/// Normalized extension of a file, with `jpeg`/`tiff` folded into `jpg`/`tif`.
fn normalized_format(format: &str) -> String {
    match format.to_ascii_lowercase().as_str() {
        "jpeg" => "jpg".to_string(),
        "tiff" => "tif".to_string(),
        other => other.to_string(),
    }
}

fn io_failure(identifier: &str, err: io::Error) -> ImageError {
    if err.kind() == io::ErrorKind::NotFound {
        ImageError::not_found(format!("Image not found: {}", identifier))
    } else {
        ImageError::multimedia(500, format!("Cannot read image {}: {}", identifier, err))
    }
}

#[async_trait]
impl ImageProvider for FsImageProvider {
    fn validate(&self, request: &ImageRequest) -> Result<(), ImageError> {
        if !QUALITIES.contains(&request.quality.as_str()) {
            return Err(ImageError::Validation(format!(
                "Invalid quality: {}",
                request.quality
            )));
        }
        if !is_known_format(&request.format) {
            return Err(ImageError::Validation(format!(
                "Invalid format: {}",
                request.format
            )));
        }
        Ok(())
    }

    async fn info(&self, identifier: &str) -> Result<ImageInfo, ImageError> {
        let path = self.resolve(identifier)?;
        let name = identifier.to_string();

        let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(path))
            .await
            .map_err(|e| ImageError::multimedia(500, format!("Image reader panicked: {}", e)))?;

        let (width, height) = dimensions.map_err(|e| match e {
            image::ImageError::IoError(io_err) => io_failure(&name, io_err),
            other => ImageError::Format(format!("Cannot decode image {}: {}", name, other)),
        })?;

        debug!(identifier = %name, width, height, "Read image dimensions");
        Ok(ImageInfo { width, height })
    }

    async fn render(&self, request: &ImageRequest) -> Result<Bytes, ImageError> {
        let path = self.resolve(&request.identifier)?;

        if request.region != "full" {
            return Err(ImageError::Crop(format!(
                "Cannot crop region {}: only full images are served",
                request.region
            )));
        }
        if request.size != "full" && request.size != "max" {
            return Err(ImageError::Resize(format!(
                "Cannot resize to {}: only full size is served",
                request.size
            )));
        }
        if request.rotation != "0" {
            return Err(ImageError::Rotate(format!(
                "Cannot rotate by {}: only unrotated images are served",
                request.rotation
            )));
        }
        if !IDENTITY_QUALITIES.contains(&request.quality.as_str()) {
            return Err(ImageError::Quality(format!(
                "Cannot convert to {} quality",
                request.quality
            )));
        }

        let source_format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalized_format)
            .unwrap_or_default();
        if normalized_format(&request.format) != source_format {
            return Err(ImageError::Format(format!(
                "Cannot convert {} to {}",
                request.identifier, request.format
            )));
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| io_failure(&request.identifier, e))?;
        Ok(Bytes::from(data))
    }
}
