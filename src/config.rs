//! Configuration management for the IIIF image server.
//!
//! Every option can be given on the command line or through an environment
//! variable with the `IIIF_` prefix:
//!
//! - `IIIF_HOST` - Server bind address (default: 0.0.0.0)
//! - `IIIF_PORT` - Server port (default: 3000)
//! - `IIIF_IMAGE_ROOT` - Directory images are served from (required)
//! - `IIIF_API_PREFIX` - Mount point of the IIIF routes (default: /api/multimedia/image)
//! - `IIIF_CACHE_IMAGES` - Image cache capacity in bytes (default: 100MB)
//! - `IIIF_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `IIIF_HTTP_CACHE` - Send ETag / Last-Modified and answer 304 (default: true)
//! - `IIIF_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use iiif_axum::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::provider::DEFAULT_IMAGE_CACHE_CAPACITY;
use crate::server::{DEFAULT_API_PREFIX, DEFAULT_CACHE_MAX_AGE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// IIIF image server.
///
/// Serves images from a local directory through the IIIF Image API, with
/// conditional GET support.
#[derive(Parser, Debug, Clone)]
#[command(name = "iiif-axum")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IIIF_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IIIF_PORT")]
    pub port: u16,

    /// Path the IIIF routes are mounted under. Empty mounts them at the root.
    #[arg(long, default_value = DEFAULT_API_PREFIX, env = "IIIF_API_PREFIX")]
    pub api_prefix: String,

    // =========================================================================
    // Image Configuration
    // =========================================================================
    /// Directory containing the images. Identifiers are paths relative to it.
    #[arg(long, env = "IIIF_IMAGE_ROOT")]
    pub image_root: PathBuf,

    /// Capacity of the rendered image cache in bytes.
    #[arg(long, default_value_t = DEFAULT_IMAGE_CACHE_CAPACITY, env = "IIIF_CACHE_IMAGES")]
    pub cache_images: usize,

    // =========================================================================
    // HTTP Caching
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "IIIF_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Send ETag / Last-Modified and answer conditional requests with 304.
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "IIIF_HTTP_CACHE"
    )]
    pub http_cache: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IIIF_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.image_root.is_dir() {
            return Err(format!(
                "Image root {} is not a directory. Set --image-root or IIIF_IMAGE_ROOT",
                self.image_root.display()
            ));
        }

        if self.cache_images == 0 {
            return Err("cache_images must be greater than 0".to_string());
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(format!(
                "api_prefix must be empty or start with '/', got {}",
                self.api_prefix
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
