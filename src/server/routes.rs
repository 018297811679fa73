//! Router configuration for the data formatting service.
//!
//! # Route Structure
//!
//! ```text
//! /health            GET   - Health check
//! /v1/ (or /v1)      GET   - Service status
//! /v1/markdown       POST  - Markdown to HTML
//! /v1/latex          POST  - LaTeX to HTML
//! /v1/dzi            POST  - Remote image to Deep Zoom zip
//! ```
//!
//! # Example
//!
//! ```ignore
//! use data_formatting::render::RenderService;
//! use data_formatting::server::routes::{create_router, RouterConfig};
//! use data_formatting::tiling::{DeepZoomGenerator, HttpImageFetcher, TilingService};
//!
//! let tiling = TilingService::new(HttpImageFetcher::new()?, DeepZoomGenerator::new());
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(RenderService::new(), tiling, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    dzi_handler, health_handler, latex_handler, markdown_handler, status_handler, AppState,
};
use crate::render::RenderService;
use crate::tiling::{ImageFetcher, PyramidGenerator, TilingService};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `render_service` - Markdown and LaTeX rendering
/// * `tiling_service` - Deep Zoom tiling pipeline
/// * `config` - Router configuration
pub fn create_router<F, G>(
    render_service: RenderService,
    tiling_service: TilingService<F, G>,
    config: RouterConfig,
) -> Router
where
    F: ImageFetcher,
    G: PyramidGenerator,
{
    let app_state = AppState::new(render_service, tiling_service);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/v1", get(status_handler))
        .route("/v1/", get(status_handler))
        .route("/v1/markdown", post(markdown_handler::<F, G>))
        .route("/v1/latex", post(latex_handler::<F, G>))
        .route("/v1/dzi", post(dzi_handler::<F, G>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
