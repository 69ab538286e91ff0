use thiserror::Error;

use crate::geometry::{DevicePx, Rect, Size};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Row-major tile layout over a device-pixel extent.
///
/// Edge tiles are clipped to the extent, so the last column and row may be narrower
/// than `tile_edge`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GridLayout {
    size: Size<DevicePx>,
    tile_edge: u32,
    tiles_per_row: u32,
    tiles_per_column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridLayoutError {
    #[error("tile index out of bounds")]
    TileIndexOutOfBounds,
}

impl GridLayout {
    pub fn new(size: Size<DevicePx>, tile_edge: u32) -> Self {
        let tile_edge = tile_edge.max(1);
        let tiles_along = |extent: i64| -> u32 {
            if extent <= 0 {
                0
            } else {
                u32::try_from(extent).unwrap_or(u32::MAX).div_ceil(tile_edge)
            }
        };
        Self {
            size,
            tile_edge,
            tiles_per_row: tiles_along(size.width),
            tiles_per_column: tiles_along(size.height),
        }
    }

    pub const fn size(&self) -> Size<DevicePx> {
        self.size
    }

    pub const fn tile_edge(&self) -> u32 {
        self.tile_edge
    }

    pub const fn tiles_per_row(&self) -> u32 {
        self.tiles_per_row
    }

    pub const fn tiles_per_column(&self) -> u32 {
        self.tiles_per_column
    }

    pub const fn max_tiles(&self) -> usize {
        self.tiles_per_row as usize * self.tiles_per_column as usize
    }

    pub fn tile_index(&self, tile: TilePos) -> Result<usize, GridLayoutError> {
        if tile.x >= self.tiles_per_row || tile.y >= self.tiles_per_column {
            Err(GridLayoutError::TileIndexOutOfBounds)
        } else {
            Ok(tile.y as usize * self.tiles_per_row as usize + tile.x as usize)
        }
    }

    pub fn tile_pos(&self, index: usize) -> Result<TilePos, GridLayoutError> {
        if index >= self.max_tiles() {
            Err(GridLayoutError::TileIndexOutOfBounds)
        } else {
            let x = index % self.tiles_per_row as usize;
            let y = index / self.tiles_per_row as usize;
            Ok(TilePos::new(x as u32, y as u32))
        }
    }

    /// Device-pixel area covered by `tile`, clipped to the layout extent.
    pub fn tile_rect(&self, tile: TilePos) -> Rect<DevicePx> {
        let edge = i64::from(self.tile_edge);
        let x = i64::from(tile.x) * edge;
        let y = i64::from(tile.y) * edge;
        Rect::from_edges(
            x,
            y,
            (x + edge).min(self.size.width),
            (y + edge).min(self.size.height),
        )
    }

    /// Indices of every tile overlapping `area`, row by row.
    pub fn tiles_overlapping(&self, area: &Rect<DevicePx>) -> impl Iterator<Item = usize> + '_ {
        let clipped = area.intersect(&Rect::from_size(self.size));
        let edge = i64::from(self.tile_edge);
        let (first_col, last_col, first_row, last_row) = if clipped.is_empty() {
            (0, 0, 0, 0)
        } else {
            (
                clipped.x / edge,
                (clipped.right() - 1) / edge + 1,
                clipped.y / edge,
                (clipped.bottom() - 1) / edge + 1,
            )
        };
        let per_row = self.tiles_per_row as usize;
        (first_row..last_row).flat_map(move |row| {
            (first_col..last_col).map(move |col| row as usize * per_row + col as usize)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_tiles_are_clipped_to_extent() {
        let layout = GridLayout::new(Size::new(300, 100), 256);
        assert_eq!(layout.max_tiles(), 2);
        assert_eq!(layout.tile_rect(TilePos::new(1, 0)), Rect::new(256, 0, 44, 100));
    }

    #[test]
    fn index_and_position_agree() {
        let layout = GridLayout::new(Size::new(1000, 600), 256);
        for index in 0..layout.max_tiles() {
            let pos = layout.tile_pos(index).unwrap();
            assert_eq!(layout.tile_index(pos).unwrap(), index);
        }
        assert_eq!(
            layout.tile_pos(layout.max_tiles()),
            Err(GridLayoutError::TileIndexOutOfBounds)
        );
    }

    #[test]
    fn overlap_query_skips_tiles_outside_area() {
        let layout = GridLayout::new(Size::new(1024, 1024), 256);
        let hits: Vec<usize> = layout
            .tiles_overlapping(&Rect::new(300, 300, 256, 10))
            .collect();
        assert_eq!(hits, vec![5, 6]);
        assert_eq!(layout.tiles_overlapping(&Rect::new(2000, 0, 5, 5)).count(), 0);
    }

    #[test]
    fn empty_extent_has_no_tiles() {
        assert_eq!(GridLayout::new(Size::new(0, 500), 256).max_tiles(), 0);
    }
}
