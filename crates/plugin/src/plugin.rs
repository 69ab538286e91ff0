use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use callback::{DecodedPayload, Event, EventType, TileInvalidation, parse_invalidate_tiles};
use crossbeam_channel::{Receiver, bounded};
use document::{DocumentClient, DocumentError, EventBus, MountMode, SubscriptionId};
use engine::{DocumentEngine, EngineError, ViewAccess};
use model::transform::twips_to_device_rect;
use model::{CssPx, DevicePx, PartIndex, Point, PointF, Rect, Size, Twips};
use renderer::{PaintFrame, PaintResult, RepaintPipeline, RepaintRequest};
use thiserror::Error;
use view::{GeometryChange, ViewportController, ViewportError};

use crate::config::PluginConfig;
use crate::sink::CallbackSink;
use crate::tile_renderer::{InFlightRender, SequenceTileRenderer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("no document is mounted")]
    NotMounted,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

/// Notifications for the host page, drained with `OfficePlugin::take_host_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The view drew for the first time. Carries the state changes reported before.
    Ready { state_changes: Vec<DecodedPayload> },
    /// A callback of a type the host asked to receive through `forward`.
    Callback { event: Event, payload: DecodedPayload },
}

/// Everything callback handlers may touch.
pub struct PluginState<E: DocumentEngine> {
    client: Option<DocumentClient<E>>,
    viewport: ViewportController,
    pipeline: RepaintPipeline,
    part: PartIndex,
    in_flight: Vec<InFlightRender>,
    host_events: Vec<HostEvent>,
}

impl<E: DocumentEngine> PluginState<E> {
    fn new(config: &PluginConfig) -> Self {
        Self {
            client: None,
            viewport: ViewportController::new(),
            pipeline: RepaintPipeline::new(config.paint, config.tiles),
            part: 0,
            in_flight: Vec::new(),
            host_events: Vec::new(),
        }
    }

    pub fn client(&self) -> Option<&DocumentClient<E>> {
        self.client.as_ref()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn pipeline(&self) -> &RepaintPipeline {
        &self.pipeline
    }

    pub fn part(&self) -> PartIndex {
        self.part
    }

    fn mounted_client(&self) -> Option<&DocumentClient<E>> {
        self.client.as_ref().filter(|client| client.is_mounted())
    }

    fn document_size(&self) -> Size<Twips> {
        self.client
            .as_ref()
            .map_or_else(Size::zero, DocumentClient::document_size)
    }

    fn handle_invalidate_tiles(&mut self, event: &Event) {
        let Some(client) = self.client.as_mut().filter(|client| client.is_mounted()) else {
            return;
        };
        if let Some(state_changes) = client.mark_ready() {
            self.host_events.push(HostEvent::Ready { state_changes });
        }
        let single_grid = client.kind().uses_single_grid();
        let target_part = |part: Option<PartIndex>, current: PartIndex| {
            if single_grid { 0 } else { part.unwrap_or(current) }
        };

        match parse_invalidate_tiles(event.text().unwrap_or_default()) {
            TileInvalidation::EntirePart { part } => {
                let part = target_part(part, self.part);
                self.pipeline.request(RepaintRequest::InvalidatePart { part });
                if part == self.part {
                    self.pipeline.trigger_full_rerender();
                }
            }
            TileInvalidation::Rect { rect, part } => {
                let part = target_part(part, self.part);
                self.pipeline
                    .request(RepaintRequest::InvalidateTiles { part, rect });
                if part == self.part {
                    let pixels = twips_to_device_rect(&rect, self.viewport.total_scale());
                    let on_surface = self.viewport.document_to_surface(&pixels);
                    self.pipeline
                        .request(RepaintRequest::InvalidateSurface(on_surface));
                }
            }
            TileInvalidation::Nothing => {}
        }
    }

    fn handle_document_size_changed(&mut self, payload: &DecodedPayload) {
        let Some(client) = self.client.as_mut().filter(|client| client.is_mounted()) else {
            return;
        };
        if let Err(err) = client.refresh_size() {
            tracing::warn!("[plugin] unable to refresh document size: {err}");
            if let Some(&[width, height, ..]) = payload.as_numbers() {
                client.set_document_size(Size::new(width as i64, height as i64));
            }
        }
        self.rebuild_grids();
        self.refresh_areas();
        self.pipeline.trigger_full_rerender();
    }

    fn handle_state_changed(&mut self, event: &Event) {
        let Some(client) = self.client.as_mut() else {
            return;
        };
        if let Some(text) = event.text() {
            client.handle_state_change(text);
        }
    }

    /// Matches the grid set to the document's parts at the current scale.
    fn rebuild_grids(&mut self) {
        let Some(client) = self.mounted_client() else {
            return;
        };
        let grid_count = client.grid_count();
        let document_size = client.document_size();
        if self.part >= grid_count {
            self.part = 0;
        }
        let scale = self.viewport.total_scale();
        self.pipeline
            .grids_mut()
            .resize(grid_count, scale, document_size);
    }

    /// Recomputes the areas and pulls the scroll offset back inside the document.
    /// Callers follow up with a full rerender.
    fn refresh_areas(&mut self) {
        let document_size = self.document_size();
        let page_rects = self
            .client
            .as_ref()
            .map(|client| client.page_rects().to_vec())
            .unwrap_or_default();
        self.viewport.clamp_scroll(document_size);
        self.viewport.recalculate_areas(document_size, &page_rects);
        self.sync_frame();
    }

    /// Rereads the document layout from the engine after callbacks were lost.
    fn resync_document(&mut self) {
        let Some(client) = self.client.as_mut().filter(|client| client.is_mounted()) else {
            return;
        };
        if let Err(err) = client.refresh_size() {
            tracing::warn!("[plugin] unable to refresh document size: {err}");
        }
        self.rebuild_grids();
        self.pipeline.grids_mut().invalidate_all();
    }

    fn sync_frame(&mut self) {
        self.pipeline.set_frame(PaintFrame {
            available_area: self.viewport.available_area(),
            scroll: self.viewport.scroll_position(),
            scale: self.viewport.total_scale(),
            part: self.part,
        });
    }

    fn apply_geometry_change(&mut self, change: GeometryChange) {
        let GeometryChange::Changed {
            surface_resized, ..
        } = change
        else {
            return;
        };
        if surface_resized {
            self.pipeline.resize_surface(self.viewport.surface_size());
        }
        self.rebuild_grids();
        self.refresh_areas();
        self.pipeline.trigger_full_rerender();
    }

    /// Hands finished late renders to the pipeline.
    fn collect_late_renders(&mut self) {
        let pipeline = &mut self.pipeline;
        self.in_flight.retain(|render| match render.poll() {
            Some(outcome) => {
                pipeline.request(RepaintRequest::CompleteRender {
                    key: render.key,
                    outcome,
                });
                false
            }
            None => true,
        });
    }
}

/// One document view inside a host page.
pub struct OfficePlugin<E: DocumentEngine> {
    config: PluginConfig,
    bus: EventBus<PluginState<E>>,
    subscriptions: Vec<SubscriptionId>,
    forwarded: Vec<EventType>,
    state: PluginState<E>,
    events: Receiver<Event>,
    sink: CallbackSink,
    overflowed: Arc<AtomicBool>,
}

impl<E: DocumentEngine> OfficePlugin<E> {
    pub fn new(config: PluginConfig) -> Self {
        let (sender, events) = bounded(config.event_capacity);
        let overflowed = Arc::new(AtomicBool::new(false));
        Self {
            config,
            bus: EventBus::new(),
            subscriptions: Vec::new(),
            forwarded: Vec::new(),
            state: PluginState::new(&config),
            events,
            sink: CallbackSink::new(sender, Arc::clone(&overflowed)),
            overflowed,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Sink to register with the engine's callback mechanism.
    pub fn callback_sink(&self) -> CallbackSink {
        self.sink.clone()
    }

    pub fn state(&self) -> &PluginState<E> {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted_client().is_some()
    }

    /// Asks for callbacks of `event_type` to be passed on as `HostEvent::Callback`.
    /// Takes effect on the next `render_document`.
    pub fn forward(&mut self, event_type: EventType) {
        if !self.forwarded.contains(&event_type) {
            self.forwarded.push(event_type);
        }
    }

    /// Mounts a view of the document behind `access` and starts drawing it. A document
    /// already shown is unmounted first.
    pub fn render_document(
        &mut self,
        access: ViewAccess<E>,
        mode: MountMode,
    ) -> Result<(), PluginError> {
        if self.state.client.is_some() {
            self.unmount()?;
        }

        let mut client = DocumentClient::new(access);
        let view = client.mount(mode)?;
        let language = self.config.view_language;
        client.access().with_view(view, move |engine| {
            engine.set_view_language(view, language);
            engine.reset_selection();
        })?;
        self.state.client = Some(client);
        self.state.part = 0;
        self.subscribe_handlers();

        self.state.rebuild_grids();
        self.state.refresh_areas();
        self.trigger_full_rerender();
        tracing::debug!("[plugin] rendering document in view {}", view.0);
        Ok(())
    }

    fn subscribe_handlers(&mut self) {
        let bus = &mut self.bus;
        self.subscriptions.extend([
            bus.subscribe(EventType::InvalidateTiles, |state, event, _| {
                state.handle_invalidate_tiles(event)
            }),
            bus.subscribe(EventType::DocumentSizeChanged, |state, _, payload| {
                state.handle_document_size_changed(payload)
            }),
            bus.subscribe(EventType::StateChanged, |state, event, _| {
                state.handle_state_changed(event)
            }),
        ]);
        for event_type in &self.forwarded {
            let id = bus.subscribe(*event_type, |state, event, payload| {
                state.host_events.push(HostEvent::Callback {
                    event: event.clone(),
                    payload: payload.clone(),
                });
            });
            self.subscriptions.push(id);
        }
    }

    /// Stops drawing: handlers go first, then the tile cache, then the engine view.
    pub fn unmount(&mut self) -> Result<(), PluginError> {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        self.state.in_flight.clear();
        self.state.pipeline.grids_mut().clear();
        let Some(mut client) = self.state.client.take() else {
            return Ok(());
        };
        client.unmount()?;
        Ok(())
    }

    /// Processes queued engine callbacks and finished late renders.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.bus.dispatch(&mut self.state, &event);
        }
        if self.overflowed.swap(false, Ordering::AcqRel) {
            tracing::warn!("[plugin] callbacks were dropped, resyncing the document");
            self.state.resync_document();
            self.trigger_full_rerender();
        }
        self.state.collect_late_renders();
        self.state.pipeline.pump();
    }

    /// Runs one paint pass. Pending rects are queued for the next pass.
    pub fn paint(&mut self) -> PaintResult {
        self.pump();
        let state = &mut self.state;
        let Some(client) = state.client.as_ref() else {
            return PaintResult::default();
        };
        let Some(view) = client.view() else {
            return PaintResult::default();
        };
        let mut renderer = SequenceTileRenderer::new(client.access(), view, &mut state.in_flight);
        let result = state.pipeline.paint(&mut renderer);
        for rect in &result.pending {
            state
                .pipeline
                .request(RepaintRequest::InvalidateSurface(*rect));
        }
        result
    }

    /// True while surface damage waits for a paint pass.
    pub fn needs_paint(&self) -> bool {
        !self.state.pipeline.damage().is_empty()
    }

    /// Renders awaiting the engine after their paint pass ended.
    pub fn late_render_count(&self) -> usize {
        self.state.in_flight.len()
    }

    pub fn surface(&self) -> &tiles::Bitmap {
        self.state.pipeline.surface()
    }

    /// Recomputes the viewport areas and repaints the whole surface.
    pub fn trigger_full_rerender(&mut self) {
        self.state.refresh_areas();
        self.state.pipeline.trigger_full_rerender();
    }

    pub fn on_viewport_changed(
        &mut self,
        css_rect: Rect<CssPx>,
        device_scale: f64,
    ) -> Result<GeometryChange, PluginError> {
        let change = self
            .state
            .viewport
            .on_viewport_changed(css_rect, device_scale)?;
        self.state.apply_geometry_change(change);
        Ok(change)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<GeometryChange, PluginError> {
        let document_size = self.state.document_size();
        let change = self.state.viewport.set_zoom(zoom, document_size)?;
        self.state.apply_geometry_change(change);
        Ok(change)
    }

    /// Scrolls to `position`, shifting surface content instead of repainting it.
    pub fn update_scroll(&mut self, position: PointF<CssPx>) -> Result<(), PluginError> {
        if !self.is_mounted() {
            return Err(PluginError::NotMounted);
        }
        let document_size = self.state.document_size();
        let commands = self
            .state
            .viewport
            .update_scroll(position, document_size)?;
        let area = self.state.viewport.available_area();
        for command in commands {
            self.state
                .pipeline
                .request(RepaintRequest::Scroll { area, command });
        }
        self.state.sync_frame();
        Ok(())
    }

    /// Shows another part of a multi-part document.
    pub fn select_part(&mut self, part: PartIndex) -> Result<(), PluginError> {
        let Some(client) = self.state.mounted_client() else {
            return Err(PluginError::NotMounted);
        };
        if part >= client.grid_count() || part == self.state.part {
            return Ok(());
        }
        self.state.part = part;
        self.state.viewport.reset_scroll();
        self.state.sync_frame();
        self.trigger_full_rerender();
        Ok(())
    }

    pub fn surface_point_to_twips(&self, point: PointF<DevicePx>) -> Option<Point<Twips>> {
        self.state.viewport.surface_point_to_twips(point)
    }

    pub fn take_host_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.state.host_events)
    }

    pub fn can_copy(&self) -> bool {
        self.state.client().is_some_and(DocumentClient::can_copy)
    }

    pub fn can_undo(&self) -> bool {
        self.state.client().is_some_and(DocumentClient::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.state.client().is_some_and(DocumentClient::can_redo)
    }
}

impl<E: DocumentEngine> Drop for OfficePlugin<E> {
    fn drop(&mut self) {
        if let Err(err) = self.unmount() {
            tracing::warn!("[plugin] unmount on drop failed: {err}");
        }
    }
}
