//! # Data Formatting
//!
//! A small HTTP service that formats content for display.
//!
//! ## Features
//!
//! - **Markdown**: GitHub-flavoured Markdown to HTML via `comrak`
//! - **LaTeX**: `$`/`$$`-delimited math to HTML via KaTeX
//! - **Deep Zoom**: fetch a remote image, cut it into a DZI tile pyramid and
//!   stream the result back as a zip archive
//!
//! ## Architecture
//!
//! - [`render`] - Text renderers and the lock-guarded render service
//! - [`tiling`] - Fetching, pyramid generation, workspaces and zip streaming
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for every stage
//!
//! ## Example
//!
//! ```rust,no_run
//! use data_formatting::{create_router, DeepZoomGenerator, HttpImageFetcher, RenderService,
//!     RouterConfig, TilingService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tiling = TilingService::new(HttpImageFetcher::new()?, DeepZoomGenerator::new());
//!     let router = create_router(RenderService::new(), tiling, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod server;
pub mod tiling;

// Re-export commonly used types
pub use config::Config;
pub use error::{FetchError, GenerationError, RenderError, TilingError};
pub use render::{normalize_latex, KatexRenderer, MarkdownRenderer, RenderService, TextRenderer};
pub use server::{
    create_router, AppState, DziRequest, ErrorResponse, HealthResponse, RouterConfig,
    StatusResponse,
};
pub use tiling::{
    stream_zip, DeepZoomGenerator, HttpImageFetcher, ImageFetcher, PyramidGenerator,
    PyramidSummary, TileEntry, TileFormat, TileWorkspace, TilingService, ZipStream,
};
