mod geometry;
mod layout;
mod scroll;
pub mod transform;

pub use geometry::{
    CssPx, CssRect, DevicePx, DeviceRect, Dip, Point, PointF, Rect, Size, SizeF, TwipRect, Twips,
};
pub use layout::{GridLayout, GridLayoutError, TilePos};
pub use scroll::{Axis, ScrollCommand};
pub use transform::TotalScale;

/// Zero-based index of a part (sheet, slide, page group) within a document.
pub type PartIndex = usize;
