use std::time::Instant;

use model::{
    DevicePx, GridLayout, PartIndex, Point, Rect, Size, TilePos, TotalScale, Twips, transform,
};

use crate::render::{RenderJob, RenderOutcome, TileJobKey, TileRenderer};
use crate::{Bitmap, TileGridConfig, TileValidity};

#[derive(Debug)]
enum BitmapSlot {
    Empty,
    Ready(Bitmap),
    /// Lent to a render job that has not come back yet.
    InFlight,
}

#[derive(Debug)]
pub struct Tile {
    pos: TilePos,
    bounds: Rect<Twips>,
    pixels: Rect<DevicePx>,
    slot: BitmapSlot,
    epoch: u64,
}

impl Tile {
    pub fn pos(&self) -> TilePos {
        self.pos
    }

    /// Document area covered by the tile. Neighbouring tiles share edges exactly.
    pub fn bounds(&self) -> Rect<Twips> {
        self.bounds
    }

    /// Device-pixel area of the tile in document space.
    pub fn pixels(&self) -> Rect<DevicePx> {
        self.pixels
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        match &self.slot {
            BitmapSlot::Ready(bitmap) => Some(bitmap),
            BitmapSlot::Empty | BitmapSlot::InFlight => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.slot, BitmapSlot::InFlight)
    }
}

/// A tile touched by a paint pass, classified as ready or pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    pub part: PartIndex,
    pub index: usize,
    pub bounds: Rect<Twips>,
    pub pixels: Rect<DevicePx>,
}

/// Surface that valid tiles are copied into.
///
/// `origin` is the document-space device pixel drawn at surface `(0, 0)`; `clip` limits
/// writes, in surface pixels.
pub struct PaintTarget<'a> {
    pub surface: &'a mut Bitmap,
    pub origin: Point<DevicePx>,
    pub clip: Rect<DevicePx>,
}

impl PaintTarget<'_> {
    fn blit_tile(&mut self, tile_pixels: &Rect<DevicePx>, bitmap: &Bitmap) {
        let on_surface = tile_pixels.offset(-self.origin.x, -self.origin.y);
        let visible = on_surface.intersect(&self.clip);
        if visible.is_empty() {
            return;
        }
        let src_rect = visible.offset(-on_surface.x, -on_surface.y);
        self.surface.blit(bitmap, &src_rect, visible.origin());
    }
}

/// Raster cache for one document part at one total scale.
#[derive(Debug)]
pub struct TileGrid {
    part: PartIndex,
    scale: TotalScale,
    generation: u64,
    document_size: Size<Twips>,
    layout: GridLayout,
    tiles: Vec<Tile>,
    validity: TileValidity,
}

impl TileGrid {
    pub fn new(
        part: PartIndex,
        scale: TotalScale,
        document_size: Size<Twips>,
        config: TileGridConfig,
        generation: u64,
    ) -> Self {
        let layout = GridLayout::new(
            transform::twips_to_device_size(document_size, scale),
            config.tile_edge,
        );
        let twips_per_device = 1.0 / scale.device_per_twip();
        let to_twips = |edge: i64| (edge as f64 * twips_per_device).round() as i64;
        let tiles = (0..layout.max_tiles())
            .filter_map(|index| layout.tile_pos(index).ok())
            .map(|pos| {
                let pixels = layout.tile_rect(pos);
                let bounds = Rect::from_edges(
                    to_twips(pixels.x),
                    to_twips(pixels.y),
                    to_twips(pixels.right()),
                    to_twips(pixels.bottom()),
                );
                Tile {
                    pos,
                    bounds,
                    pixels,
                    slot: BitmapSlot::Empty,
                    epoch: 0,
                }
            })
            .collect::<Vec<_>>();
        let validity = TileValidity::new(tiles.len());
        Self {
            part,
            scale,
            generation,
            document_size,
            layout,
            tiles,
            validity,
        }
    }

    pub fn part(&self) -> PartIndex {
        self.part
    }

    pub fn scale(&self) -> TotalScale {
        self.scale
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn document_size(&self) -> Size<Twips> {
        self.document_size
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tile_at(&self, pos: TilePos) -> Option<&Tile> {
        self.layout
            .tile_index(pos)
            .ok()
            .and_then(|index| self.tiles.get(index))
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.validity.is_valid(index)
    }

    pub fn valid_count(&self) -> usize {
        self.validity.valid_count()
    }

    pub fn is_fully_valid(&self) -> bool {
        self.validity.is_complete()
    }

    /// Marks every tile invalid. Bitmaps stay allocated for reuse.
    pub fn invalidate_all(&mut self) {
        self.validity.invalidate_all();
        for tile in &mut self.tiles {
            tile.epoch += 1;
        }
    }

    /// Marks invalid every tile whose bounds overlap `rect`. Returns how many tiles
    /// were touched.
    pub fn invalidate_rect(&mut self, rect: &Rect<Twips>) -> usize {
        let candidates = self.tiles_intersecting(rect);
        for &index in &candidates {
            self.validity.invalidate(index);
            self.tiles[index].epoch += 1;
        }
        candidates.len()
    }

    /// Indices of tiles whose bounds overlap `rect`, in row-major order.
    pub fn tiles_intersecting(&self, rect: &Rect<Twips>) -> Vec<usize> {
        if rect.is_empty() {
            return Vec::new();
        }
        let search = transform::twips_to_device_rect(rect, self.scale);
        // Tile bounds round to the nearest twip, so search one pixel wider.
        let search = Rect::from_edges(
            search.x - 1,
            search.y - 1,
            search.right() + 1,
            search.bottom() + 1,
        );
        self.layout
            .tiles_overlapping(&search)
            .filter(|&index| {
                self.tiles
                    .get(index)
                    .is_some_and(|tile| tile.bounds.intersects(rect))
            })
            .collect()
    }

    /// Brings every tile overlapping `dirty` up to date where the deadline allows.
    ///
    /// `dirty` is in document-space device pixels, so only tiles whose pixels meet it
    /// are touched, whatever the scale. Valid tiles are copied into `target` and reported in `ready`. Invalid tiles are
    /// rendered while `deadline` has not passed; tiles that could not be rendered stay
    /// invalid and go to `pending`.
    pub fn paint_invalid_tiles(
        &mut self,
        target: &mut PaintTarget<'_>,
        dirty: &Rect<DevicePx>,
        deadline: Instant,
        renderer: &mut dyn TileRenderer,
        ready: &mut Vec<TileRegion>,
        pending: &mut Vec<TileRegion>,
    ) {
        let candidates: Vec<usize> = self.layout.tiles_overlapping(dirty).collect();
        for index in candidates {
            let region = self.region(index);
            if self.validity.is_valid(index) {
                if let Some(bitmap) = self.tiles[index].bitmap() {
                    target.blit_tile(&region.pixels, bitmap);
                }
                ready.push(region);
                continue;
            }
            if self.tiles[index].is_in_flight() || Instant::now() >= deadline {
                pending.push(region);
                continue;
            }

            let job = self.prepare_job(index);
            let tile = &mut self.tiles[index];
            match renderer.render_tile(job, deadline) {
                RenderOutcome::Rendered(bitmap) => {
                    target.blit_tile(&region.pixels, &bitmap);
                    tile.slot = BitmapSlot::Ready(bitmap);
                    self.validity.set_valid(index);
                    ready.push(region);
                }
                RenderOutcome::Deferred => {
                    tile.slot = BitmapSlot::InFlight;
                    pending.push(region);
                }
                RenderOutcome::Failed { bitmap, error } => {
                    tracing::warn!(
                        "[tiles] render failed part={} tile={:?}: {error}",
                        self.part,
                        tile.pos
                    );
                    tile.slot = BitmapSlot::Ready(bitmap);
                    pending.push(region);
                }
            }
        }
    }

    /// Applies a render result that arrived after its paint pass.
    ///
    /// Returns the tile's device rect when the result made the tile valid. Results for
    /// another grid generation or an older tile epoch only return the bitmap to the slot.
    pub fn complete_render(&mut self, key: TileJobKey, outcome: RenderOutcome) -> Option<Rect<DevicePx>> {
        if key.generation != self.generation {
            return None;
        }
        let tile = self.tiles.get_mut(key.index)?;
        if !tile.is_in_flight() {
            return None;
        }
        let current = key.epoch == tile.epoch;
        match outcome {
            RenderOutcome::Rendered(bitmap) => {
                tile.slot = BitmapSlot::Ready(bitmap);
                if current && self.validity.set_valid(key.index) {
                    return Some(tile.pixels);
                }
                None
            }
            RenderOutcome::Failed { bitmap, error } => {
                tracing::warn!(
                    "[tiles] late render failed part={} index={}: {error}",
                    key.part,
                    key.index
                );
                tile.slot = BitmapSlot::Ready(bitmap);
                None
            }
            RenderOutcome::Deferred => {
                tile.slot = BitmapSlot::Empty;
                None
            }
        }
    }

    fn region(&self, index: usize) -> TileRegion {
        let tile = &self.tiles[index];
        TileRegion {
            part: self.part,
            index,
            bounds: tile.bounds,
            pixels: tile.pixels,
        }
    }

    fn prepare_job(&mut self, index: usize) -> RenderJob {
        let tile = &mut self.tiles[index];
        let width = tile.pixels.width as u32;
        let height = tile.pixels.height as u32;
        let bitmap = match std::mem::replace(&mut tile.slot, BitmapSlot::InFlight) {
            BitmapSlot::Ready(mut bitmap) => {
                if bitmap.width() != width || bitmap.height() != height {
                    bitmap.reset_dimensions(width, height);
                }
                bitmap
            }
            BitmapSlot::Empty | BitmapSlot::InFlight => Bitmap::new(width, height),
        };
        RenderJob {
            key: TileJobKey {
                generation: self.generation,
                part: self.part,
                index,
                epoch: tile.epoch,
            },
            area: tile.bounds,
            bitmap,
        }
    }
}
