use http::StatusCode;
use thiserror::Error;

/// Boxed error used for failures this crate does not classify.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the image collaborator (validation, lookup, processing).
///
/// Every variant maps to a definite HTTP status; see [`ImageError::status`].
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// Region extraction failed
    #[error("{0}")]
    Crop(String),

    /// Scaling to the requested size failed
    #[error("{0}")]
    Resize(String),

    /// Encoding to the requested format failed
    #[error("{0}")]
    Format(String),

    /// Rotation failed
    #[error("{0}")]
    Rotate(String),

    /// Quality conversion (color, gray, bitonal) failed
    #[error("{0}")]
    Quality(String),

    /// Request parameters did not pass validation
    #[error("{0}")]
    Validation(String),

    /// Generic domain failure carrying its own status code
    #[error("{message}")]
    Multimedia { code: u16, message: String },

    /// Image could not be located
    #[error("{message}")]
    NotFound { code: u16, message: String },
}

impl ImageError {
    /// Create a generic domain failure with an explicit status code.
    pub fn multimedia(code: u16, message: impl Into<String>) -> Self {
        ImageError::Multimedia {
            code,
            message: message.into(),
        }
    }

    /// Create a not-found failure with status 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        ImageError::NotFound {
            code: 404,
            message: message.into(),
        }
    }

    /// HTTP status this failure translates to.
    ///
    /// Processing failures are always 500 and validation failures always 400.
    /// Domain and not-found failures use their embedded code, falling back to
    /// 500 when that code is not a 4xx or 5xx status.
    pub fn status(&self) -> StatusCode {
        match self {
            ImageError::Crop(_)
            | ImageError::Resize(_)
            | ImageError::Format(_)
            | ImageError::Rotate(_)
            | ImageError::Quality(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ImageError::Validation(_) => StatusCode::BAD_REQUEST,
            ImageError::Multimedia { code, .. } | ImageError::NotFound { code, .. } => {
                match StatusCode::from_u16(*code) {
                    Ok(status) if status.is_client_error() || status.is_server_error() => status,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
        }
    }

    /// Short identifier used in the `error` field of JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ImageError::Crop(_) => "crop_error",
            ImageError::Resize(_) => "resize_error",
            ImageError::Format(_) => "format_error",
            ImageError::Rotate(_) => "rotate_error",
            ImageError::Quality(_) => "quality_error",
            ImageError::Validation(_) => "validation_error",
            ImageError::Multimedia { .. } => "multimedia_error",
            ImageError::NotFound { .. } => "not_found",
        }
    }
}

/// Failure returned by an [`Endpoint`](crate::decorators::Endpoint).
///
/// `Image` failures are translated to HTTP responses by the error-handling
/// decorator. `Unclassified` failures are never translated and travel to the
/// framework boundary.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("unhandled failure: {0}")]
    Unclassified(BoxError),
}

impl HandlerError {
    /// Wrap any error as an unclassified failure.
    pub fn unclassified(err: impl Into<BoxError>) -> Self {
        HandlerError::Unclassified(err.into())
    }
}
