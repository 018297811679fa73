//! Deep Zoom Image (DZI) geometry and descriptor.
//!
//! Deep Zoom numbers levels from the bottom of the pyramid:
//! - level 0 is 1x1 pixel
//! - the max level is the full-resolution image
//!
//! Each level halves the one above it, rounding up, and is cut into square
//! tiles of `tile_size` pixels. Neighbouring tiles share `overlap` pixels on
//! each interior edge.

use std::fmt;

/// Image format used for generated tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TileFormat {
    /// Lossy JPEG (RGB only)
    #[default]
    #[value(alias = "jpg")]
    Jpeg,
    /// Lossless PNG
    Png,
}

impl TileFormat {
    /// File extension used for tiles, also written as the DZI `Format`.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Jpeg => "jpg",
            TileFormat::Png => "png",
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Generate the DZI XML descriptor.
///
/// # Example Output
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
///        TileSize="254"
///        Overlap="1"
///        Format="jpg">
///   <Size Width="4096" Height="3072" />
/// </Image>
/// ```
pub fn generate_dzi_xml(
    width: u32,
    height: u32,
    tile_size: u32,
    overlap: u32,
    format: TileFormat,
) -> String {
    let format = format.extension();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="http://schemas.microsoft.com/deepzoom/2008"
       TileSize="{tile_size}"
       Overlap="{overlap}"
       Format="{format}">
  <Size Width="{width}" Height="{height}" />
</Image>
"#
    )
}

/// Highest DZI level for the given image, `ceil(log2(max(width, height)))`.
pub fn calculate_max_dzi_level(width: u32, height: u32) -> usize {
    let max_dim = width.max(height);
    if max_dim <= 1 {
        return 0;
    }
    (u32::BITS - (max_dim - 1).leading_zeros()) as usize
}

/// Dimensions of a DZI level: each side is `ceil(side / 2^(max_level - level))`.
///
/// Returns `(0, 0)` for levels above `max_dzi_level`.
pub fn dzi_level_dimensions(
    width: u32,
    height: u32,
    dzi_level: usize,
    max_dzi_level: usize,
) -> (u32, u32) {
    if dzi_level > max_dzi_level {
        return (0, 0);
    }

    let scale = 1u64 << (max_dzi_level - dzi_level);
    let level_width = (width as u64).div_ceil(scale) as u32;
    let level_height = (height as u64).div_ceil(scale) as u32;

    (level_width.max(1), level_height.max(1))
}

/// Number of tile columns and rows at a level.
pub fn dzi_tile_count(level_width: u32, level_height: u32, tile_size: u32) -> (u32, u32) {
    let tiles_x = level_width.div_ceil(tile_size);
    let tiles_y = level_height.div_ceil(tile_size);
    (tiles_x.max(1), tiles_y.max(1))
}

/// Pixel rectangle `(x, y, width, height)` covered by tile `(col, row)`,
/// including overlap with its neighbours and clipped to the level.
pub fn dzi_tile_bounds(
    col: u32,
    row: u32,
    level_width: u32,
    level_height: u32,
    tile_size: u32,
    overlap: u32,
) -> (u32, u32, u32, u32) {
    let span = |index: u32, extent: u32| {
        let start = (index as u64 * tile_size as u64).saturating_sub(overlap as u64);
        let end = ((index as u64 + 1) * tile_size as u64 + overlap as u64).min(extent as u64);
        (start as u32, end.saturating_sub(start) as u32)
    };

    let (x, w) = span(col, level_width);
    let (y, h) = span(row, level_height);
    (x, y, w, h)
}
