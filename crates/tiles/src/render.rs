use std::time::Instant;

use model::{PartIndex, Rect, Twips};
use thiserror::Error;

use crate::Bitmap;

/// Identifies one render request for one tile.
///
/// `generation` names the grid instance and `epoch` the tile's invalidation count at
/// dispatch time. A result whose key no longer matches is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileJobKey {
    pub generation: u64,
    pub part: PartIndex,
    pub index: usize,
    pub epoch: u64,
}

#[derive(Debug)]
pub struct RenderJob {
    pub key: TileJobKey,
    /// Document area to draw, in twips.
    pub area: Rect<Twips>,
    /// Target raster, already sized to the tile. Reused between renders.
    pub bitmap: Bitmap,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("document engine is unavailable")]
    EngineUnavailable,
    #[error("render result was dropped before delivery")]
    Abandoned,
}

#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(Bitmap),
    /// Still running; the bitmap comes back later through `TileGridSet::complete_render`.
    Deferred,
    Failed { bitmap: Bitmap, error: RenderError },
}

pub trait TileRenderer {
    /// Draws `job.area` into `job.bitmap`, giving up waiting at `deadline`.
    fn render_tile(&mut self, job: RenderJob, deadline: Instant) -> RenderOutcome;
}
