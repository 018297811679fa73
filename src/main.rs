//! Data formatting service.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use data_formatting::{
    config::Config,
    render::RenderService,
    server::{create_router, RouterConfig},
    tiling::{DeepZoomGenerator, HttpImageFetcher, TilingService},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!(
        "  Fetch: timeout {}s, max {} MiB per source",
        config.fetch_timeout_secs,
        config.max_source_bytes / (1024 * 1024)
    );
    info!(
        "  Tiles: {}px, overlap {}, {} (quality {})",
        config.tile_size, config.tile_overlap, config.tile_format, config.tile_quality
    );
    match config.workspace_dir {
        Some(ref dir) => info!("  Workspaces: {}", dir.display()),
        None => info!("  Workspaces: system temp dir"),
    }

    let fetcher = match HttpImageFetcher::with_limits(
        Duration::from_secs(config.fetch_timeout_secs),
        config.max_source_bytes,
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let generator = DeepZoomGenerator::new()
        .with_tile_size(config.tile_size)
        .with_overlap(config.tile_overlap)
        .with_format(config.tile_format)
        .with_quality(config.tile_quality);

    let mut tiling_service = TilingService::new(fetcher, generator);
    if let Some(ref dir) = config.workspace_dir {
        tiling_service = tiling_service.with_workspace_parent(dir);
    }

    let router = create_router(
        RenderService::new(),
        tiling_service,
        build_router_config(&config),
    );

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/v1/", addr);
    info!("    curl -d '# Hello' http://{}/v1/markdown", addr);
    info!("    curl -d '$e^{{i\\pi}}+1=0$' http://{}/v1/latex", addr);
    info!(
        "    curl -o image.zip -d '{{\"get_url\":\"<url>\"}}' http://{}/v1/dzi",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("██████╗ ███████╗███╗   ███╗████████╗");
    info!("██╔══██╗██╔════╝████╗ ████║╚══██╔══╝");
    info!("██║  ██║█████╗  ██╔████╔██║   ██║   ");
    info!("██║  ██║██╔══╝  ██║╚██╔╝██║   ██║   ");
    info!("██████╔╝██║     ██║ ╚═╝ ██║   ██║   ");
    info!("╚═════╝ ╚═╝     ╚═╝     ╚═╝   ╚═╝   ");
    info!("");
    info!("        data formatting v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "data_formatting=debug,tower_http=debug"
    } else {
        "data_formatting=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
