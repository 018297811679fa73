//! Configuration management for the data formatting service.
//!
//! Options come from command-line arguments via clap, fall back to
//! environment variables with the `DFMT_` prefix, then to defaults.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use data_formatting::config::Config;
//!
//! let config = Config::parse();
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `DFMT_HOST` - Server bind address (default: 0.0.0.0)
//! - `DFMT_PORT` - Server port (default: 5000)
//! - `DFMT_FETCH_TIMEOUT_SECS` - Source image fetch timeout (default: 60)
//! - `DFMT_MAX_SOURCE_BYTES` - Source image size limit (default: 256 MiB)
//! - `DFMT_TILE_SIZE` - Deep Zoom tile edge in pixels (default: 254)
//! - `DFMT_TILE_OVERLAP` - Deep Zoom tile overlap in pixels (default: 1)
//! - `DFMT_TILE_FORMAT` - `jpeg` or `png` (default: jpeg)
//! - `DFMT_TILE_QUALITY` - JPEG tile quality (default: 75)
//! - `DFMT_WORKSPACE_DIR` - Parent directory for tiling workspaces
//! - `DFMT_CORS_ORIGINS` - Comma-separated allowed origins

use std::path::PathBuf;

use clap::Parser;

use crate::tiling::{
    TileFormat, DEFAULT_MAX_SOURCE_BYTES, DEFAULT_TILE_OVERLAP, DEFAULT_TILE_QUALITY,
    DEFAULT_TILE_SIZE, MAX_TILE_QUALITY, MIN_TILE_QUALITY,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default source fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Data formatting service.
///
/// Renders Markdown and LaTeX to HTML and turns remote images into
/// Deep Zoom tile archives.
#[derive(Parser, Debug, Clone)]
#[command(name = "data-formatting")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DFMT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DFMT_PORT")]
    pub port: u16,

    // =========================================================================
    // Source Fetching
    // =========================================================================
    /// Timeout for fetching a source image, in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS, env = "DFMT_FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: u64,

    /// Largest source image accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_SOURCE_BYTES, env = "DFMT_MAX_SOURCE_BYTES")]
    pub max_source_bytes: u64,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Deep Zoom tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "DFMT_TILE_SIZE")]
    pub tile_size: u32,

    /// Pixels shared between neighbouring tiles.
    #[arg(long, default_value_t = DEFAULT_TILE_OVERLAP, env = "DFMT_TILE_OVERLAP")]
    pub tile_overlap: u32,

    /// Image format of generated tiles.
    #[arg(long, value_enum, default_value_t = TileFormat::Jpeg, env = "DFMT_TILE_FORMAT")]
    pub tile_format: TileFormat,

    /// JPEG quality for generated tiles (1-100).
    #[arg(long, default_value_t = DEFAULT_TILE_QUALITY, env = "DFMT_TILE_QUALITY")]
    pub tile_quality: u8,

    /// Directory in which per-request tiling workspaces are created.
    ///
    /// Defaults to the system temporary directory.
    #[arg(long, env = "DFMT_WORKSPACE_DIR")]
    pub workspace_dir: Option<PathBuf>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DFMT_CORS_ORIGINS", value_delimiter = ',')]
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
        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be greater than 0".to_string());
        }

        if self.max_source_bytes == 0 {
            return Err("max_source_bytes must be greater than 0".to_string());
        }

        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        if self.tile_overlap >= self.tile_size {
            return Err("tile_overlap must be smaller than tile_size".to_string());
        }

        if !(MIN_TILE_QUALITY..=MAX_TILE_QUALITY).contains(&self.tile_quality) {
            return Err(format!(
                "tile_quality must be between {} and {}",
                MIN_TILE_QUALITY, MAX_TILE_QUALITY
            ));
        }

        if let Some(dir) = &self.workspace_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "workspace_dir {} does not exist or is not a directory",
                    dir.display()
                ));
            }
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
