//! Raster tile cache for document parts.
//!
//! A `TileGrid` covers one part at one total scale and owns the bitmap of every tile.
//! Validity is tracked per tile; invalid tiles are re-rendered through a
//! `TileRenderer` during a paint pass, bounded by a deadline.

mod bitmap;
mod grid;
mod grid_set;
mod render;
mod validity;

pub use bitmap::Bitmap;
pub use grid::{PaintTarget, Tile, TileGrid, TileRegion};
pub use grid_set::TileGridSet;
pub use render::{RenderError, RenderJob, RenderOutcome, TileJobKey, TileRenderer};
pub use validity::TileValidity;

pub const DEFAULT_TILE_EDGE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGridConfig {
    /// Tile edge length in device pixels.
    pub tile_edge: u32,
}

impl Default for TileGridConfig {
    fn default() -> Self {
        Self {
            tile_edge: DEFAULT_TILE_EDGE,
        }
    }
}
