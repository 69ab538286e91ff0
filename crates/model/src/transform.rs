//! Conversions between twips, CSS pixels and device pixels.
//!
//! Twips reach device pixels through CSS pixels: `twips -> css = twips * zoom / 15`,
//! then `css -> device = css * device_scale`. Fractional results are rounded exactly
//! once at the end of a chain; intermediate values stay in `f64`.
//!
//! Rectangles round outward (floor the origin, ceil the far edge) so no covered pixel
//! is lost. Sizes ceil. Points round to nearest. Edges land within `ROUNDING_EPSILON`
//! of an integer snap to it before flooring or ceiling.

use crate::geometry::{CssPx, DevicePx, Point, PointF, Rect, Size, SizeF, Twips};

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const CSS_PIXELS_PER_INCH: f64 = 96.0;
pub const TWIPS_PER_PIXEL: f64 = TWIPS_PER_INCH / CSS_PIXELS_PER_INCH;

const ROUNDING_EPSILON: f64 = 1e-6;

/// Combined zoom and device scale factor.
///
/// Two scales compare equal when their products are equal; the tile cache is keyed on
/// the product, not on the factors.
#[derive(Debug, Clone, Copy)]
pub struct TotalScale {
    zoom: f64,
    device_scale: f64,
}

impl TotalScale {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        device_scale: 1.0,
    };

    pub const fn new(zoom: f64, device_scale: f64) -> Self {
        Self { zoom, device_scale }
    }

    pub const fn zoom(self) -> f64 {
        self.zoom
    }

    pub const fn device_scale(self) -> f64 {
        self.device_scale
    }

    pub fn value(self) -> f64 {
        self.zoom * self.device_scale
    }

    /// Device pixels per twip.
    pub fn device_per_twip(self) -> f64 {
        self.value() / TWIPS_PER_PIXEL
    }
}

impl Default for TotalScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PartialEq for TotalScale {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

pub fn twips_to_pixels(value: f64, zoom: f64) -> f64 {
    value * zoom / TWIPS_PER_PIXEL
}

pub fn pixels_to_twips(value: f64, zoom: f64) -> f64 {
    value * TWIPS_PER_PIXEL / zoom
}

pub fn floor_edge(value: f64) -> i64 {
    (value + ROUNDING_EPSILON).floor() as i64
}

pub fn ceil_edge(value: f64) -> i64 {
    (value - ROUNDING_EPSILON).ceil() as i64
}

/// Smallest integer rect in `V` enclosing `rect` scaled by `factor`.
pub fn scale_to_enclosing_rect<U, V>(rect: &Rect<U>, factor: f64) -> Rect<V> {
    if rect.is_empty() {
        return Rect::new(floor_edge(rect.x as f64 * factor), floor_edge(rect.y as f64 * factor), 0, 0);
    }
    Rect::from_edges(
        floor_edge(rect.x as f64 * factor),
        floor_edge(rect.y as f64 * factor),
        ceil_edge(rect.right() as f64 * factor),
        ceil_edge(rect.bottom() as f64 * factor),
    )
}

pub fn scale_to_ceiled_size<U, V>(size: Size<U>, factor: f64) -> Size<V> {
    Size::new(
        ceil_edge(size.width as f64 * factor).max(0),
        ceil_edge(size.height as f64 * factor).max(0),
    )
}

pub fn scale_to_rounded_point<U, V>(point: PointF<U>, factor: f64) -> Point<V> {
    Point::new(
        (point.x * factor).round() as i64,
        (point.y * factor).round() as i64,
    )
}

pub fn twips_to_css_rect(rect: &Rect<Twips>, zoom: f64) -> Rect<CssPx> {
    scale_to_enclosing_rect(rect, zoom / TWIPS_PER_PIXEL)
}

pub fn twips_to_device_rect(rect: &Rect<Twips>, scale: TotalScale) -> Rect<DevicePx> {
    if rect.is_empty() {
        return Rect::empty();
    }
    let to_device = |edge: i64| twips_to_pixels(edge as f64, scale.zoom) * scale.device_scale;
    Rect::from_edges(
        floor_edge(to_device(rect.x)),
        floor_edge(to_device(rect.y)),
        ceil_edge(to_device(rect.right())),
        ceil_edge(to_device(rect.bottom())),
    )
}

pub fn device_to_twips_rect(rect: &Rect<DevicePx>, scale: TotalScale) -> Rect<Twips> {
    if rect.is_empty() {
        return Rect::empty();
    }
    let to_twips = |edge: i64| pixels_to_twips(edge as f64 / scale.device_scale, scale.zoom);
    Rect::from_edges(
        floor_edge(to_twips(rect.x)),
        floor_edge(to_twips(rect.y)),
        ceil_edge(to_twips(rect.right())),
        ceil_edge(to_twips(rect.bottom())),
    )
}

pub fn twips_to_css_size(size: Size<Twips>, zoom: f64) -> SizeF<CssPx> {
    SizeF::new(
        twips_to_pixels(size.width as f64, zoom),
        twips_to_pixels(size.height as f64, zoom),
    )
}

pub fn twips_to_device_size(size: Size<Twips>, scale: TotalScale) -> Size<DevicePx> {
    scale_to_ceiled_size(size, scale.device_per_twip())
}

/// Maps a surface point back to the nearest twip.
pub fn device_to_twips_point(point: PointF<DevicePx>, scale: TotalScale) -> Point<Twips> {
    scale_to_rounded_point(point, 1.0 / scale.device_per_twip())
}

pub fn css_to_device_point(point: PointF<CssPx>, device_scale: f64) -> Point<DevicePx> {
    scale_to_rounded_point(point, device_scale)
}

/// Reinterprets a CSS rect in device pixels, rounding outward.
pub fn css_to_device_rect(rect: &Rect<CssPx>, device_scale: f64) -> Rect<DevicePx> {
    scale_to_enclosing_rect(rect, device_scale)
}

/// Same numbers, different space. Only for values whose scale factor is exactly 1.
pub fn reinterpret_rect<U, V>(rect: &Rect<U>) -> Rect<V> {
    rect.cast_unit()
}

pub fn reinterpret_point<U, V>(point: Point<U>) -> Point<V> {
    point.cast_unit()
}
