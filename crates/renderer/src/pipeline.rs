use std::collections::VecDeque;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use model::{Axis, DevicePx, PartIndex, Point, Rect, ScrollCommand, Size, TotalScale, Twips};
use thiserror::Error;
use tiles::{
    Bitmap, PaintTarget, RenderOutcome, TileGridConfig, TileGridSet, TileJobKey, TileRegion,
    TileRenderer,
};

use crate::PaintConfig;
use crate::dirty::DirtyRectMask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintState {
    Idle,
    Painting,
}

/// A change to the cache or the surface. Requests made while a paint pass runs are
/// queued and applied, in arrival order, once it ends.
#[derive(Debug)]
pub enum RepaintRequest {
    InvalidateTiles { part: PartIndex, rect: Rect<Twips> },
    InvalidatePart { part: PartIndex },
    /// Surface pixels to repaint on the next pass.
    InvalidateSurface(Rect<DevicePx>),
    Scroll { area: Rect<DevicePx>, command: ScrollCommand },
    CompleteRender { key: TileJobKey, outcome: RenderOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RepaintError {
    #[error("repaint pipeline is gone")]
    Closed,
}

/// Cloneable sender for code that cannot borrow the pipeline, such as tile renderers
/// running inside a paint pass.
#[derive(Debug, Clone)]
pub struct RepaintHandle {
    sender: Sender<RepaintRequest>,
}

impl RepaintHandle {
    pub fn submit(&self, request: RepaintRequest) -> Result<(), RepaintError> {
        self.sender.send(request).map_err(|_| RepaintError::Closed)
    }
}

/// Where the document sits on the surface for the coming paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintFrame {
    /// Surface area that shows document content.
    pub available_area: Rect<DevicePx>,
    /// Document-space device pixel shown at the available area's origin.
    pub scroll: Point<DevicePx>,
    pub scale: TotalScale,
    pub part: PartIndex,
}

impl PaintFrame {
    /// Document-space device pixel drawn at surface `(0, 0)`.
    pub fn document_origin(&self) -> Point<DevicePx> {
        Point::new(
            self.scroll.x - self.available_area.x,
            self.scroll.y - self.available_area.y,
        )
    }

    pub fn surface_to_document(&self, rect: &Rect<DevicePx>) -> Rect<DevicePx> {
        let origin = self.document_origin();
        rect.offset(origin.x, origin.y)
    }

    pub fn document_to_surface(&self, rect: &Rect<DevicePx>) -> Rect<DevicePx> {
        let origin = self.document_origin();
        rect.offset(-origin.x, -origin.y)
    }
}

impl Default for PaintFrame {
    fn default() -> Self {
        Self {
            available_area: Rect::empty(),
            scroll: Point::zero(),
            scale: TotalScale::IDENTITY,
            part: 0,
        }
    }
}

/// Outcome of one paint pass, in surface pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaintResult {
    /// Rects the host may show now. On a clearing pass this includes the whole
    /// surface, which then means cleared to background, not that every tile in it is
    /// valid; rects also listed in `pending` still wait for their tiles.
    pub ready: Vec<Rect<DevicePx>>,
    /// Rects whose tiles missed the deadline or failed.
    pub pending: Vec<Rect<DevicePx>>,
    /// The surface was cleared to the background colour before painting.
    pub cleared: bool,
}

pub struct RepaintPipeline {
    config: PaintConfig,
    state: PaintState,
    grids: TileGridSet,
    surface: Bitmap,
    first_paint: bool,
    damage: DirtyRectMask,
    frame: PaintFrame,
    deferred: VecDeque<RepaintRequest>,
    sender: Sender<RepaintRequest>,
    receiver: Receiver<RepaintRequest>,
}

impl RepaintPipeline {
    pub fn new(config: PaintConfig, grid_config: TileGridConfig) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            config,
            state: PaintState::Idle,
            grids: TileGridSet::new(grid_config),
            surface: Bitmap::default(),
            first_paint: true,
            damage: DirtyRectMask::default(),
            frame: PaintFrame::default(),
            deferred: VecDeque::new(),
            sender,
            receiver,
        }
    }

    pub fn handle(&self) -> RepaintHandle {
        RepaintHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn state(&self) -> PaintState {
        self.state
    }

    pub fn config(&self) -> PaintConfig {
        self.config
    }

    pub fn grids(&self) -> &TileGridSet {
        &self.grids
    }

    pub fn grids_mut(&mut self) -> &mut TileGridSet {
        &mut self.grids
    }

    pub fn surface(&self) -> &Bitmap {
        &self.surface
    }

    pub fn frame(&self) -> PaintFrame {
        self.frame
    }

    pub fn set_frame(&mut self, frame: PaintFrame) {
        self.frame = frame;
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Surface rects waiting for the next paint, in the order they were recorded.
    pub fn damage(&self) -> Vec<Rect<DevicePx>> {
        self.damage.rects(&self.surface.bounds())
    }

    /// Reallocates the surface when its size changes. The next paint clears it.
    pub fn resize_surface(&mut self, size: Size<DevicePx>) {
        let width = u32::try_from(size.width.max(0)).unwrap_or(0);
        let height = u32::try_from(size.height.max(0)).unwrap_or(0);
        if self.surface.width() == width && self.surface.height() == height {
            return;
        }
        tracing::debug!("[renderer] surface resized to {width}x{height}");
        self.surface = Bitmap::new(width, height);
        self.first_paint = true;
        self.damage.mark_full();
    }

    /// Marks the whole surface for repaint without touching tile validity.
    pub fn trigger_full_rerender(&mut self) {
        self.request(RepaintRequest::InvalidateSurface(self.surface.bounds()));
    }

    pub fn request(&mut self, request: RepaintRequest) {
        match self.state {
            PaintState::Painting => self.deferred.push_back(request),
            PaintState::Idle => self.apply(request),
        }
    }

    /// Applies everything submitted through handles since the last call.
    pub fn pump(&mut self) {
        while let Ok(request) = self.receiver.try_recv() {
            self.request(request);
        }
    }

    /// Runs one paint pass over the accumulated damage.
    pub fn paint(&mut self, renderer: &mut dyn TileRenderer) -> PaintResult {
        self.pump();
        let mut result = PaintResult::default();
        if self.surface.is_empty() {
            return result;
        }

        self.state = PaintState::Painting;
        if self.first_paint {
            self.first_paint = false;
            self.surface.fill(self.config.background);
            result.ready.push(self.surface.bounds());
            result.cleared = true;
        }

        let bounds = self.surface.bounds();
        let dirty_rects = self.damage.take_rects(&bounds);
        let frame = self.frame;
        let deadline = Instant::now() + self.config.budget;

        match self.grids.get_mut(frame.part) {
            Some(grid) if grid.scale() == frame.scale => {
                let origin = frame.document_origin();
                for rect in dirty_rects {
                    let dirty = rect.intersect(&bounds).intersect(&frame.available_area);
                    if dirty.is_empty() {
                        continue;
                    }
                    let document_rect = frame.surface_to_document(&dirty);
                    let mut ready = Vec::new();
                    let mut pending = Vec::new();
                    let mut target = PaintTarget {
                        surface: &mut self.surface,
                        origin,
                        clip: dirty,
                    };
                    grid.paint_invalid_tiles(
                        &mut target,
                        &document_rect,
                        deadline,
                        renderer,
                        &mut ready,
                        &mut pending,
                    );
                    collect_on_surface(&frame, &dirty, &ready, &mut result.ready);
                    collect_on_surface(&frame, &dirty, &pending, &mut result.pending);

                    while let Ok(request) = self.receiver.try_recv() {
                        self.deferred.push_back(request);
                    }
                }
            }
            Some(_) => {
                tracing::debug!(
                    "[renderer] grid for part {} is stale, deferring paint",
                    frame.part
                );
                result.pending.extend(dirty_rects);
            }
            None => {
                tracing::debug!("[renderer] no grid for part {}", frame.part);
                result.pending.extend(dirty_rects);
            }
        }

        self.state = PaintState::Idle;
        self.flush_deferred();
        result
    }

    fn flush_deferred(&mut self) {
        if !self.deferred.is_empty() {
            tracing::debug!(
                "[renderer] applying {} request(s) deferred during paint",
                self.deferred.len()
            );
        }
        while let Some(request) = self.deferred.pop_front() {
            self.apply(request);
        }
        self.pump();
    }

    fn apply(&mut self, request: RepaintRequest) {
        match request {
            RepaintRequest::InvalidateTiles { part, rect } => match self.grids.get_mut(part) {
                Some(grid) => {
                    grid.invalidate_rect(&rect);
                }
                None => tracing::debug!("[renderer] tile invalidation for unknown part {part}"),
            },
            RepaintRequest::InvalidatePart { part } => match self.grids.get_mut(part) {
                Some(grid) => grid.invalidate_all(),
                None => tracing::debug!("[renderer] part invalidation for unknown part {part}"),
            },
            RepaintRequest::InvalidateSurface(rect) => {
                let bounds = self.surface.bounds();
                self.damage.mark_rect(&rect, &bounds);
            }
            RepaintRequest::Scroll { area, command } => self.scroll(&area, command),
            RepaintRequest::CompleteRender { key, outcome } => {
                let Some(pixels) = self.grids.complete_render(key, outcome) else {
                    return;
                };
                if key.part != self.frame.part {
                    return;
                }
                let on_surface = self
                    .frame
                    .document_to_surface(&pixels)
                    .intersect(&self.frame.available_area);
                let bounds = self.surface.bounds();
                self.damage.mark_rect(&on_surface, &bounds);
            }
        }
    }

    fn scroll(&mut self, area: &Rect<DevicePx>, command: ScrollCommand) {
        let bounds = self.surface.bounds();
        let area = area.intersect(&bounds);
        if area.is_empty() || command.delta == 0 {
            return;
        }
        let (delta_x, delta_y, extent) = match command.axis {
            Axis::Horizontal => (command.delta, 0, area.width),
            Axis::Vertical => (0, command.delta, area.height),
        };
        if command.delta.abs() >= extent {
            self.damage.mark_rect(&area, &bounds);
            return;
        }

        self.surface.shift_region(&area, delta_x, delta_y);
        self.damage.shift_within(&area, delta_x, delta_y);
        let exposed = match command.axis {
            Axis::Horizontal if delta_x > 0 => area.with_width(delta_x),
            Axis::Horizontal => Rect::new(area.right() + delta_x, area.y, -delta_x, area.height),
            Axis::Vertical if delta_y > 0 => area.with_height(delta_y),
            Axis::Vertical => Rect::new(area.x, area.bottom() + delta_y, area.width, -delta_y),
        };
        self.damage.mark_rect(&exposed, &bounds);
    }
}

fn collect_on_surface(
    frame: &PaintFrame,
    dirty: &Rect<DevicePx>,
    regions: &[TileRegion],
    out: &mut Vec<Rect<DevicePx>>,
) {
    for region in regions {
        let rect = frame.document_to_surface(&region.pixels).intersect(dirty);
        if !rect.is_empty() {
            out.push(rect);
        }
    }
}
