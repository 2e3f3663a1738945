//! IIIF image server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iiif_axum::{
    config::Config,
    server::{create_router, RouterConfig},
    FsImageProvider, IiifExtension, ImageRequest,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("iiif-axum v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Image root: {}", config.image_root.display());
    info!(
        "  API prefix: {}",
        if config.api_prefix.is_empty() {
            "/"
        } else {
            config.api_prefix.as_str()
        }
    );
    info!(
        "  Cache: {}MB images, max-age {}s",
        config.cache_images / (1024 * 1024),
        config.cache_max_age
    );
    if config.http_cache {
        info!("  Conditional GET: enabled");
    } else {
        warn!("  Conditional GET: DISABLED - no ETag / Last-Modified validators are sent");
    }

    let provider = FsImageProvider::new(config.image_root.clone());
    let extension = build_extension(&provider, config.http_cache);

    let router = create_router(provider, extension, build_router_config(&config));

    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!(
        "  curl http://{}{}/v2/<identifier>/info.json",
        addr, config.api_prefix
    );

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "iiif_axum=debug,tower_http=debug"
    } else {
        "iiif_axum=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Register the image API callbacks backed by the filesystem provider.
fn build_extension(provider: &FsImageProvider, http_cache: bool) -> IiifExtension<ImageRequest> {
    let extension = IiifExtension::new().with_api_decorator_callback(|request: &ImageRequest| {
        debug!(
            version = %request.version,
            identifier = %request.identifier,
            "Image API call"
        );
        Ok(())
    });

    if !http_cache {
        return extension;
    }

    provider.register_validators(extension)
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_api_prefix(config.api_prefix.as_str())
        .with_cache_max_age(config.cache_max_age)
        .with_image_cache_capacity(config.cache_images);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
