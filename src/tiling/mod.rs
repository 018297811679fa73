//! Deep Zoom tiling of remote images.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TilingService                          │
//! │                                                              │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌───────────────┐  │
//! │  │ ImageFetcher  │  │ PyramidGenerator │  │  stream_zip   │  │
//! │  │  (reqwest)    │  │ (image + dzi)    │  │  (zip crate)  │  │
//! │  └───────────────┘  └──────────────────┘  └───────────────┘  │
//! │                    TileWorkspace (tempfile)                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod archive;
pub mod dzi;
pub mod fetch;
pub mod pyramid;
pub mod service;
pub mod workspace;

pub use archive::{stream_zip, TileEntry, ZipStream, TILE_FILE_PERMISSIONS};
pub use dzi::{
    calculate_max_dzi_level, dzi_level_dimensions, dzi_tile_bounds, dzi_tile_count,
    generate_dzi_xml, TileFormat,
};
pub use fetch::{HttpImageFetcher, ImageFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_SOURCE_BYTES};
pub use pyramid::{
    DeepZoomGenerator, PyramidGenerator, PyramidSummary, DEFAULT_TILE_OVERLAP, DEFAULT_TILE_QUALITY,
    DEFAULT_TILE_SIZE, MAX_TILE_QUALITY, MIN_TILE_QUALITY,
};
pub use service::TilingService;
pub use workspace::{OutputFile, TileWorkspace, OUTPUT_DIR_NAME, PYRAMID_NAME};
