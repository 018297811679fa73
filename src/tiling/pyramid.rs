//! Deep Zoom pyramid generation.
//!
//! [`DeepZoomGenerator`] writes the standard DZI layout next to a basename:
//!
//! ```text
//! <output_dir>/<name>.dzi
//! <output_dir>/<name>_files/<level>/<col>_<row>.<ext>
//! ```

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::GenerationError;

use super::dzi::{
    calculate_max_dzi_level, dzi_level_dimensions, dzi_tile_bounds, dzi_tile_count,
    generate_dzi_xml, TileFormat,
};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 254;

/// Default overlap between neighbouring tiles in pixels.
pub const DEFAULT_TILE_OVERLAP: u32 = 1;

/// Default JPEG quality for tiles.
pub const DEFAULT_TILE_QUALITY: u8 = 75;

/// Minimum allowed JPEG quality.
pub const MIN_TILE_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_TILE_QUALITY: u8 = 100;

/// Summary of a generated pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidSummary {
    /// Full-resolution width
    pub width: u32,
    /// Full-resolution height
    pub height: u32,
    /// Number of levels written
    pub levels: usize,
    /// Number of tile files written
    pub tiles: usize,
}

/// Turns a source image file into a tree of tile files.
///
/// Generation is CPU-bound and synchronous; callers run it on a blocking
/// thread.
pub trait PyramidGenerator: Send + Sync + 'static {
    /// Read `source` and write the pyramid for `name` under `output_dir`.
    fn generate(
        &self,
        source: &Path,
        output_dir: &Path,
        name: &str,
    ) -> Result<PyramidSummary, GenerationError>;
}

/// Deep Zoom generator built on the `image` crate.
#[derive(Debug, Clone)]
pub struct DeepZoomGenerator {
    tile_size: u32,
    overlap: u32,
    format: TileFormat,
    quality: u8,
}

impl DeepZoomGenerator {
    /// Create a generator with default settings (254px JPEG tiles, 1px overlap).
    pub fn new() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            overlap: DEFAULT_TILE_OVERLAP,
            format: TileFormat::Jpeg,
            quality: DEFAULT_TILE_QUALITY,
        }
    }

    /// Set the tile edge length. Values below 1 are raised to 1.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn with_overlap(mut self, overlap: u32) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_format(mut self, format: TileFormat) -> Self {
        self.format = format;
        self
    }

    /// Set JPEG quality, clamped to 1-100. Ignored for PNG tiles.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(MIN_TILE_QUALITY, MAX_TILE_QUALITY);
        self
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn overlap(&self) -> u32 {
        self.overlap
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn write_level(&self, level: &DynamicImage, dir: &Path) -> Result<usize, GenerationError> {
        fs::create_dir_all(dir)?;

        let (width, height) = level.dimensions();
        let (cols, rows) = dzi_tile_count(width, height, self.tile_size);
        let ext = self.format.extension();

        for row in 0..rows {
            for col in 0..cols {
                let (x, y, w, h) =
                    dzi_tile_bounds(col, row, width, height, self.tile_size, self.overlap);
                let tile = level.crop_imm(x, y, w, h);
                let path = dir.join(format!("{col}_{row}.{ext}"));
                self.write_tile(&tile, &path)?;
            }
        }

        Ok((cols * rows) as usize)
    }

    fn write_tile(&self, tile: &DynamicImage, path: &Path) -> Result<(), GenerationError> {
        let encode_err = |message: String| GenerationError::Encode {
            path: path.display().to_string(),
            message,
        };

        match self.format {
            TileFormat::Jpeg => {
                let mut writer = BufWriter::new(File::create(path)?);
                let rgb = tile.to_rgb8();
                JpegEncoder::new_with_quality(&mut writer, self.quality)
                    .encode_image(&rgb)
                    .map_err(|e| encode_err(e.to_string()))?;
            }
            TileFormat::Png => {
                tile.save_with_format(path, ImageFormat::Png)
                    .map_err(|e| encode_err(e.to_string()))?;
            }
        }

        Ok(())
    }
}

impl Default for DeepZoomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PyramidGenerator for DeepZoomGenerator {
    fn generate(
        &self,
        source: &Path,
        output_dir: &Path,
        name: &str,
    ) -> Result<PyramidSummary, GenerationError> {
        let decode_err = |message: String| GenerationError::Decode { message };

        let image = ImageReader::open(source)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(GenerationError::EmptyImage { width, height });
        }

        let max_level = calculate_max_dzi_level(width, height);
        let files_dir = output_dir.join(format!("{name}_files"));
        debug!(width, height, max_level, "Generating Deep Zoom pyramid");

        // Each level is resampled from the one above it.
        let mut current = image;
        let mut tiles = 0;
        for level in (0..=max_level).rev() {
            let (level_width, level_height) =
                dzi_level_dimensions(width, height, level, max_level);
            if current.dimensions() != (level_width, level_height) {
                current = current.resize_exact(level_width, level_height, FilterType::Triangle);
            }
            tiles += self.write_level(&current, &files_dir.join(level.to_string()))?;
        }

        let descriptor =
            generate_dzi_xml(width, height, self.tile_size, self.overlap, self.format);
        fs::write(output_dir.join(format!("{name}.dzi")), descriptor)?;

        Ok(PyramidSummary {
            width,
            height,
            levels: max_level + 1,
            tiles,
        })
    }
}
