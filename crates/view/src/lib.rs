//! Viewport geometry: where the document sits inside the plugin surface.
//!
//! The host reports the plugin rect in CSS pixels together with the device scale and
//! the zoom. Everything the paint path needs (surface size, available area, scroll
//! offset, background gaps) is derived here in device pixels.

use model::transform::{self, TotalScale};
use model::{
    Axis, CssPx, DevicePx, Dip, Point, PointF, Rect, ScrollCommand, Size, SizeF, Twips,
};
use smallvec::SmallVec;
use thiserror::Error;

pub type ScrollCommands = SmallVec<[ScrollCommand; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewportError {
    #[error("zoom must be finite and positive")]
    InvalidZoom,
    #[error("device scale must be finite and positive")]
    InvalidDeviceScale,
    #[error("geometry value is not finite")]
    NonFiniteValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryChange {
    Unchanged,
    Changed {
        /// Zoom or device scale moved, so scale-dependent caches are stale.
        scale_changed: bool,
        /// The surface needs a new backing store.
        surface_resized: bool,
    },
}

impl GeometryChange {
    pub fn is_changed(self) -> bool {
        matches!(self, GeometryChange::Changed { .. })
    }

    pub fn scale_changed(self) -> bool {
        matches!(
            self,
            GeometryChange::Changed {
                scale_changed: true,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    css_plugin_rect: Rect<CssPx>,
    plugin_dip_size: Size<Dip>,
    surface_size: Size<DevicePx>,
    zoom: f64,
    device_scale: f64,
    /// Surface area showing document content, in surface pixels.
    available_area: Rect<DevicePx>,
    available_area_twips: Rect<Twips>,
    /// Document-space device pixel at the available area's origin.
    scroll_position: Point<DevicePx>,
    /// Gaps between and below pages, in document-space device pixels.
    background_parts: Vec<Rect<DevicePx>>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self {
            css_plugin_rect: Rect::empty(),
            plugin_dip_size: Size::zero(),
            surface_size: Size::zero(),
            zoom: 1.0,
            device_scale: 1.0,
            available_area: Rect::empty(),
            available_area_twips: Rect::empty(),
            scroll_position: Point::zero(),
            background_parts: Vec::new(),
        }
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn device_scale(&self) -> f64 {
        self.device_scale
    }

    pub fn total_scale(&self) -> TotalScale {
        TotalScale::new(self.zoom, self.device_scale)
    }

    pub fn css_plugin_rect(&self) -> Rect<CssPx> {
        self.css_plugin_rect
    }

    pub fn plugin_dip_size(&self) -> Size<Dip> {
        self.plugin_dip_size
    }

    pub fn surface_size(&self) -> Size<DevicePx> {
        self.surface_size
    }

    pub fn available_area(&self) -> Rect<DevicePx> {
        self.available_area
    }

    pub fn available_area_twips(&self) -> Rect<Twips> {
        self.available_area_twips
    }

    pub fn scroll_position(&self) -> Point<DevicePx> {
        self.scroll_position
    }

    pub fn background_parts(&self) -> &[Rect<DevicePx>] {
        &self.background_parts
    }

    /// Records a new plugin rect and device scale from the host.
    pub fn on_viewport_changed(
        &mut self,
        css_rect: Rect<CssPx>,
        device_scale: f64,
    ) -> Result<GeometryChange, ViewportError> {
        if !device_scale.is_finite() || device_scale <= 0.0 {
            return Err(ViewportError::InvalidDeviceScale);
        }
        if css_rect == self.css_plugin_rect && device_scale == self.device_scale {
            return Ok(GeometryChange::Unchanged);
        }

        let scale_changed = device_scale != self.device_scale;
        self.css_plugin_rect = css_rect;
        self.device_scale = device_scale;
        self.plugin_dip_size = Size::new(css_rect.width.max(0), css_rect.height.max(0));

        let surface_size: Size<DevicePx> =
            transform::scale_to_ceiled_size(css_rect.size(), device_scale);
        let surface_resized = surface_size != self.surface_size;
        self.surface_size = surface_size;
        tracing::debug!(
            "[view] viewport {}x{} css px at device scale {device_scale}",
            css_rect.width,
            css_rect.height
        );
        Ok(GeometryChange::Changed {
            scale_changed,
            surface_resized,
        })
    }

    /// Changes the zoom, keeping the document point at the top left where the
    /// document still allows it. The scroll offset stays within `document_size`.
    pub fn set_zoom(
        &mut self,
        zoom: f64,
        document_size: Size<Twips>,
    ) -> Result<GeometryChange, ViewportError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ViewportError::InvalidZoom);
        }
        if zoom == self.zoom {
            return Ok(GeometryChange::Unchanged);
        }
        let old_zoom = self.zoom;
        self.zoom = zoom;
        // Keep the same document point at the top left.
        let ratio = checked_div(zoom, old_zoom)?;
        self.scroll_position = Point::new(
            checked_mul(self.scroll_position.x as f64, ratio)?.round() as i64,
            checked_mul(self.scroll_position.y as f64, ratio)?.round() as i64,
        );
        self.clamp_scroll(document_size);
        tracing::debug!("[view] zoom {old_zoom} -> {zoom}");
        Ok(GeometryChange::Changed {
            scale_changed: true,
            surface_resized: false,
        })
    }

    /// Document extent in device pixels at the current scale.
    pub fn document_pixel_size(&self, document_size: Size<Twips>) -> Size<DevicePx> {
        transform::twips_to_device_size(document_size, self.total_scale())
    }

    pub fn document_css_size(&self, document_size: Size<Twips>) -> SizeF<CssPx> {
        transform::twips_to_css_size(document_size, self.zoom)
    }

    /// Recomputes the available area and the background gaps.
    ///
    /// The available area is the surface clamped to the document's pixel extent.
    pub fn recalculate_areas(&mut self, document_size: Size<Twips>, page_rects: &[Rect<Twips>]) {
        let document_pixels = self.document_pixel_size(document_size);
        let mut available = Rect::from_size(self.surface_size);
        if document_pixels.width < available.width {
            available = available.with_width(document_pixels.width);
        }
        if document_pixels.height < available.height {
            available = available.with_height(document_pixels.height);
        }
        self.available_area = available;
        self.available_area_twips = transform::device_to_twips_rect(
            &Rect::from_size(available.size()),
            self.total_scale(),
        );
        self.background_parts = background_gaps(document_size, page_rects, self.total_scale());
    }

    /// Clamps `requested` into the scrollable range and returns the surface shifts
    /// needed to follow it, one per moving axis.
    pub fn update_scroll(
        &mut self,
        requested: PointF<CssPx>,
        document_size: Size<Twips>,
    ) -> Result<ScrollCommands, ViewportError> {
        if !requested.is_finite() {
            return Err(ViewportError::NonFiniteValue);
        }
        let document_css = self.document_css_size(document_size);
        let max_x = (document_css.width - self.css_plugin_rect.width as f64).max(0.0);
        let max_y = (document_css.height - self.css_plugin_rect.height as f64).max(0.0);
        let clamped = PointF::<CssPx>::new(
            requested.x.clamp(0.0, max_x),
            requested.y.clamp(0.0, max_y),
        );
        let scrolled = transform::css_to_device_point(clamped, self.device_scale);

        let mut commands = ScrollCommands::new();
        let delta_x = self.scroll_position.x - scrolled.x;
        let delta_y = self.scroll_position.y - scrolled.y;
        if delta_x != 0 {
            commands.push(ScrollCommand::new(Axis::Horizontal, delta_x));
        }
        if delta_y != 0 {
            commands.push(ScrollCommand::new(Axis::Vertical, delta_y));
        }
        self.scroll_position = scrolled;
        Ok(commands)
    }

    /// Pulls the scroll offset back into `[0, document - surface]` per axis.
    /// Returns true when it moved.
    pub fn clamp_scroll(&mut self, document_size: Size<Twips>) -> bool {
        let document_pixels = self.document_pixel_size(document_size);
        let max_x = (document_pixels.width - self.surface_size.width).max(0);
        let max_y = (document_pixels.height - self.surface_size.height).max(0);
        let clamped = Point::new(
            self.scroll_position.x.clamp(0, max_x),
            self.scroll_position.y.clamp(0, max_y),
        );
        if clamped == self.scroll_position {
            return false;
        }
        tracing::debug!(
            "[view] scroll clamped from {:?} to {clamped:?}",
            self.scroll_position
        );
        self.scroll_position = clamped;
        true
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_position = Point::zero();
    }

    /// Maps a surface point to the nearest document twip. Points outside the available
    /// area map to nothing.
    pub fn surface_point_to_twips(&self, point: PointF<DevicePx>) -> Option<Point<Twips>> {
        if !point.is_finite() {
            return None;
        }
        let area = self.available_area;
        let inside = point.x >= area.x as f64
            && point.x < area.right() as f64
            && point.y >= area.y as f64
            && point.y < area.bottom() as f64;
        if !inside {
            return None;
        }
        let document_point = point.offset(
            (self.scroll_position.x - area.x) as f64,
            (self.scroll_position.y - area.y) as f64,
        );
        Some(transform::device_to_twips_point(
            document_point,
            self.total_scale(),
        ))
    }

    /// Surface rect showing `rect`, a document-space device rect.
    pub fn document_to_surface(&self, rect: &Rect<DevicePx>) -> Rect<DevicePx> {
        rect.offset(
            self.available_area.x - self.scroll_position.x,
            self.available_area.y - self.scroll_position.y,
        )
    }
}

/// Uncovered document areas above each page and below the last one.
fn background_gaps(
    document_size: Size<Twips>,
    page_rects: &[Rect<Twips>],
    scale: TotalScale,
) -> Vec<Rect<DevicePx>> {
    let mut gaps = Vec::new();
    let mut previous_bottom = 0;
    for page in page_rects {
        let gap = Rect::<Twips>::from_edges(page.x, previous_bottom, page.right(), page.y);
        if !gap.is_empty() {
            gaps.push(transform::twips_to_device_rect(&gap, scale));
        }
        previous_bottom = page.bottom();
    }
    if let Some(last) = page_rects.last() {
        let gap =
            Rect::<Twips>::from_edges(last.x, last.bottom(), last.right(), document_size.height);
        if !gap.is_empty() {
            gaps.push(transform::twips_to_device_rect(&gap, scale));
        }
    }
    gaps
}

fn checked_mul(left: f64, right: f64) -> Result<f64, ViewportError> {
    if !left.is_finite() || !right.is_finite() {
        return Err(ViewportError::NonFiniteValue);
    }
    let next = left * right;
    if !next.is_finite() {
        return Err(ViewportError::NonFiniteValue);
    }
    Ok(next)
}

fn checked_div(left: f64, right: f64) -> Result<f64, ViewportError> {
    if !left.is_finite() || !right.is_finite() || right == 0.0 {
        return Err(ViewportError::NonFiniteValue);
    }
    let next = left / right;
    if !next.is_finite() {
        return Err(ViewportError::NonFiniteValue);
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8.5in x 22in page stack at zoom 1: 816 x 2112 css px.
    fn letter_document() -> Size<Twips> {
        Size::new(12240, 31680)
    }

    fn viewport(width: i64, height: i64, device_scale: f64) -> ViewportController {
        let mut viewport = ViewportController::new();
        viewport
            .on_viewport_changed(Rect::new(0, 0, width, height), device_scale)
            .expect("valid viewport");
        viewport
    }

    #[test]
    fn viewport_change_reports_resize_and_scale() {
        let mut viewport = ViewportController::new();
        let change = viewport
            .on_viewport_changed(Rect::new(0, 0, 400, 300), 2.0)
            .expect("valid viewport");
        assert_eq!(
            change,
            GeometryChange::Changed {
                scale_changed: true,
                surface_resized: true
            }
        );
        assert_eq!(viewport.surface_size(), Size::new(800, 600));
        assert_eq!(
            viewport.on_viewport_changed(Rect::new(0, 0, 400, 300), 2.0),
            Ok(GeometryChange::Unchanged)
        );
        assert_eq!(
            viewport.on_viewport_changed(Rect::new(0, 0, 400, 300), 0.0),
            Err(ViewportError::InvalidDeviceScale)
        );
    }

    #[test]
    fn set_zoom_rejects_invalid_values() {
        let mut viewport = ViewportController::new();
        let document = letter_document();
        assert_eq!(viewport.set_zoom(0.0, document), Err(ViewportError::InvalidZoom));
        assert_eq!(
            viewport.set_zoom(f64::NAN, document),
            Err(ViewportError::InvalidZoom)
        );
        assert!(viewport.set_zoom(1.5, document).expect("valid zoom").scale_changed());
        assert_eq!(viewport.set_zoom(1.5, document), Ok(GeometryChange::Unchanged));
        assert_eq!(viewport.total_scale().value(), 1.5);
    }

    #[test]
    fn available_area_is_clamped_to_document() {
        let mut viewport = viewport(1000, 500, 1.0);
        viewport.recalculate_areas(letter_document(), &[]);
        assert_eq!(viewport.available_area(), Rect::new(0, 0, 816, 500));
        assert_eq!(viewport.available_area_twips(), Rect::new(0, 0, 12240, 7500));
    }

    #[test]
    fn background_gaps_cover_space_between_and_below_pages() {
        let mut viewport = viewport(1000, 500, 1.0);
        let pages = [
            Rect::new(0, 300, 12240, 15000),
            Rect::new(0, 15600, 12240, 15000),
        ];
        viewport.recalculate_areas(letter_document(), &pages);
        assert_eq!(
            viewport.background_parts(),
            &[
                Rect::new(0, 0, 816, 20),
                Rect::new(0, 1020, 816, 20),
                Rect::new(0, 2040, 816, 72),
            ]
        );
    }

    #[test]
    fn scroll_is_clamped_and_split_per_axis() {
        let mut viewport = viewport(400, 300, 2.0);
        let commands = viewport
            .update_scroll(PointF::new(50.0, 5000.0), letter_document())
            .expect("finite scroll");
        assert_eq!(
            commands.as_slice(),
            &[
                ScrollCommand::new(Axis::Horizontal, -100),
                ScrollCommand::new(Axis::Vertical, -3624),
            ]
        );
        assert_eq!(viewport.scroll_position(), Point::new(100, 3624));

        let back = viewport
            .update_scroll(PointF::new(50.0, -20.0), letter_document())
            .expect("finite scroll");
        assert_eq!(back.as_slice(), &[ScrollCommand::new(Axis::Vertical, 3624)]);
        assert!(viewport
            .update_scroll(PointF::new(f64::INFINITY, 0.0), letter_document())
            .is_err());
    }

    #[test]
    fn surface_points_map_to_document_twips() {
        let mut viewport = viewport(400, 300, 2.0);
        viewport.recalculate_areas(letter_document(), &[]);
        viewport
            .update_scroll(PointF::new(0.0, 100.0), letter_document())
            .expect("finite scroll");
        assert_eq!(
            viewport.surface_point_to_twips(PointF::new(20.0, 10.0)),
            Some(Point::new(150, 1575))
        );
        assert_eq!(viewport.surface_point_to_twips(PointF::new(900.0, 10.0)), None);
    }

    #[test]
    fn zoom_keeps_scroll_proportional() {
        let mut viewport = viewport(400, 300, 1.0);
        viewport
            .update_scroll(PointF::new(0.0, 200.0), letter_document())
            .expect("finite scroll");
        viewport.set_zoom(2.0, letter_document()).expect("valid zoom");
        assert_eq!(viewport.scroll_position(), Point::new(0, 400));
    }

    #[test]
    fn zoom_out_clamps_scroll_to_document_end() {
        let mut viewport = viewport(400, 300, 1.0);
        viewport.set_zoom(2.0, letter_document()).expect("valid zoom");
        viewport
            .update_scroll(PointF::new(0.0, 3000.0), letter_document())
            .expect("finite scroll");
        assert_eq!(viewport.scroll_position(), Point::new(0, 3000));

        viewport.set_zoom(0.25, letter_document()).expect("valid zoom");

        // 2112 css px at zoom 1 is 528 device px at 0.25.
        assert_eq!(viewport.scroll_position(), Point::new(0, 228));
        assert!(!viewport.clamp_scroll(letter_document()));
    }
}
