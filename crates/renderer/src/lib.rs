//! Paint pass driver between the tile cache and the host surface.
//!
//! `RepaintPipeline` owns the per-part tile grids and the surface bitmap. Damage is
//! accumulated as surface rects; a paint pass walks it, lets the tile grid render what
//! it can before the frame deadline and reports which surface rects are ready and
//! which are still pending.

mod dirty;
mod pipeline;

use std::time::Duration;

pub use pipeline::{
    PaintFrame, PaintResult, PaintState, RepaintError, RepaintHandle, RepaintPipeline,
    RepaintRequest,
};

pub const DEFAULT_PAINT_BUDGET: Duration = Duration::from_millis(12);
pub const DEFAULT_BACKGROUND: u32 = 0x0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintConfig {
    /// Time a paint pass may spend rendering tiles.
    pub budget: Duration,
    /// Packed premultiplied BGRA used to clear the surface on first paint.
    pub background: u32,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_PAINT_BUDGET,
            background: DEFAULT_BACKGROUND,
        }
    }
}
