use std::time::Instant;

use engine::{DocumentEngine, EngineError, Pending, ViewAccess, ViewId};
use tiles::{Bitmap, RenderError, RenderJob, RenderOutcome, TileJobKey, TileRenderer};

/// A render dispatched to the engine that missed its paint deadline.
#[derive(Debug)]
pub(crate) struct InFlightRender {
    pub(crate) key: TileJobKey,
    width: u32,
    height: u32,
    pending: Pending<Bitmap>,
}

impl InFlightRender {
    /// `Some` once the engine answered or went away.
    pub(crate) fn poll(&self) -> Option<RenderOutcome> {
        match self.pending.try_take() {
            Ok(Some(bitmap)) => Some(RenderOutcome::Rendered(bitmap)),
            Ok(None) => None,
            Err(EngineError::SequenceClosed | EngineError::Spawn(_)) => {
                Some(RenderOutcome::Failed {
                    bitmap: Bitmap::new(self.width, self.height),
                    error: RenderError::Abandoned,
                })
            }
        }
    }
}

/// Renders tiles through the engine sequence on behalf of one view.
///
/// Each tile is one engine task. The paint pass waits for it until the deadline;
/// after that the task keeps running and its result is collected by `poll`.
pub(crate) struct SequenceTileRenderer<'a, E: DocumentEngine> {
    access: &'a ViewAccess<E>,
    view: ViewId,
    in_flight: &'a mut Vec<InFlightRender>,
}

impl<'a, E: DocumentEngine> SequenceTileRenderer<'a, E> {
    pub(crate) fn new(
        access: &'a ViewAccess<E>,
        view: ViewId,
        in_flight: &'a mut Vec<InFlightRender>,
    ) -> Self {
        Self {
            access,
            view,
            in_flight,
        }
    }
}

impl<E: DocumentEngine> TileRenderer for SequenceTileRenderer<'_, E> {
    fn render_tile(&mut self, job: RenderJob, deadline: Instant) -> RenderOutcome {
        let RenderJob {
            key,
            area,
            mut bitmap,
        } = job;
        let (width, height) = (bitmap.width(), bitmap.height());
        let dispatched = self.access.dispatch_with_view(self.view, move |engine| {
            engine.paint_tile(bitmap.pixels_mut(), width, height, area);
            bitmap
        });
        let pending = match dispatched {
            Ok(pending) => pending,
            Err(err) => return unavailable(width, height, &err),
        };
        match pending.wait_until(deadline) {
            Ok(Some(bitmap)) => RenderOutcome::Rendered(bitmap),
            Ok(None) => {
                tracing::debug!(
                    "[plugin] tile {} of part {} missed the paint deadline",
                    key.index,
                    key.part
                );
                self.in_flight.push(InFlightRender {
                    key,
                    width,
                    height,
                    pending,
                });
                RenderOutcome::Deferred
            }
            Err(err) => unavailable(width, height, &err),
        }
    }
}

fn unavailable(width: u32, height: u32, err: &EngineError) -> RenderOutcome {
    tracing::warn!("[plugin] tile render failed: {err}");
    RenderOutcome::Failed {
        bitmap: Bitmap::new(width, height),
        error: RenderError::EngineUnavailable,
    }
}
