use callback::{DecodedPayload, EventType, decode, parse_multiple_rects};
use engine::{DocumentEngine, DocumentKind, EngineError, ViewAccess, ViewId};
use model::transform::{TWIPS_PER_PIXEL, ceil_edge, twips_to_css_size};
use model::{CssPx, Rect, Size, SizeF, Twips};
use thiserror::Error;

use crate::state::{StateChangeBuffer, UnoState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document is not mounted")]
    NotMounted,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// How `mount` obtains its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    /// Adopt the engine's current view, creating one only when there is none. Used by
    /// the first client of a freshly loaded document.
    ReuseCurrentView,
    CreateView,
}

/// One engine view of a document plus everything the host reads about it.
pub struct DocumentClient<E: DocumentEngine> {
    access: ViewAccess<E>,
    view: Option<ViewId>,
    kind: DocumentKind,
    parts: usize,
    document_size: Size<Twips>,
    page_rects: Vec<Rect<Twips>>,
    uno_state: UnoState,
    state_buffer: StateChangeBuffer,
}

impl<E: DocumentEngine> DocumentClient<E> {
    pub fn new(access: ViewAccess<E>) -> Self {
        Self {
            access,
            view: None,
            kind: DocumentKind::Other,
            parts: 0,
            document_size: Size::zero(),
            page_rects: Vec::new(),
            uno_state: UnoState::new(),
            state_buffer: StateChangeBuffer::new(),
        }
    }

    pub fn access(&self) -> &ViewAccess<E> {
        &self.access
    }

    pub fn view(&self) -> Option<ViewId> {
        self.view
    }

    pub fn is_mounted(&self) -> bool {
        self.view.is_some()
    }

    /// Attaches to an engine view and reads the document layout. Mounting an
    /// already mounted client returns its view unchanged.
    pub fn mount(&mut self, mode: MountMode) -> Result<ViewId, DocumentError> {
        if let Some(view) = self.view {
            return Ok(view);
        }
        let view = match mode {
            MountMode::ReuseCurrentView => match self.access.current_view()? {
                Some(view) => view,
                None => self.access.create_view()?,
            },
            MountMode::CreateView => self.access.create_view()?,
        };
        self.view = Some(view);
        self.refresh_size()?;
        tracing::debug!(
            "[document] mounted view {} ({:?}, {} parts)",
            view.0,
            self.kind,
            self.parts
        );
        Ok(view)
    }

    /// Re-reads kind, part count, size and page rectangles in one engine call.
    pub fn refresh_size(&mut self) -> Result<(), DocumentError> {
        let view = self.view.ok_or(DocumentError::NotMounted)?;
        let (kind, parts, document_size, page_rects) = self.access.with_view(view, |engine| {
            (
                engine.document_kind(),
                engine.parts(),
                engine.document_size(),
                engine.part_page_rectangles(),
            )
        })?;
        self.kind = kind;
        self.parts = parts;
        self.document_size = document_size;
        self.page_rects = parse_multiple_rects(&page_rects);
        Ok(())
    }

    /// Detaches from the engine view. The view is destroyed only while the engine
    /// still reports views; a document being torn down may already have none.
    pub fn unmount(&mut self) -> Result<(), DocumentError> {
        let Some(view) = self.view.take() else {
            return Ok(());
        };
        self.state_buffer.reset();
        if self.access.views_count()? > 0 {
            self.access.destroy_view(view)?;
        }
        tracing::debug!("[document] unmounted view {}", view.0);
        Ok(())
    }

    /// Records a state-change payload. Until the first draw, the payload is also kept
    /// for the `ready` notification.
    pub fn handle_state_change(&mut self, payload: &str) {
        self.uno_state.update(payload);
        if !self.is_mounted() || !self.state_buffer.is_live() {
            self.state_buffer.push(payload);
        }
    }

    /// Called on every tile invalidation. The first one after mount ends buffering and
    /// returns the buffered state changes, decoded, for the host's `ready` event.
    pub fn mark_ready(&mut self) -> Option<Vec<DecodedPayload>> {
        if !self.is_mounted() {
            return None;
        }
        let payloads = self.state_buffer.go_live()?;
        tracing::debug!(
            "[document] ready with {} buffered state changes",
            payloads.len()
        );
        let code = EventType::StateChanged.code();
        Some(
            payloads
                .iter()
                .map(|payload| decode(code, Some(payload.as_bytes())))
                .collect(),
        )
    }

    pub fn is_ready(&self) -> bool {
        self.is_mounted() && self.state_buffer.is_live()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Number of tile grids the document needs: one for text documents, one per part
    /// otherwise.
    pub fn grid_count(&self) -> usize {
        if self.kind.uses_single_grid() {
            1
        } else {
            self.parts.max(1)
        }
    }

    pub fn document_size(&self) -> Size<Twips> {
        self.document_size
    }

    pub fn set_document_size(&mut self, size: Size<Twips>) {
        self.document_size = size;
    }

    pub fn document_size_css(&self, zoom: f64) -> SizeF<CssPx> {
        twips_to_css_size(self.document_size, zoom)
    }

    pub fn page_rects(&self) -> &[Rect<Twips>] {
        &self.page_rects
    }

    /// Page rectangles in CSS pixels, each component rounded up.
    pub fn page_rects_css(&self, zoom: f64) -> Vec<Rect<CssPx>> {
        let factor = zoom / TWIPS_PER_PIXEL;
        let scale = |value: i64| ceil_edge(value as f64 * factor);
        self.page_rects
            .iter()
            .map(|rect| Rect::new(scale(rect.x), scale(rect.y), scale(rect.width), scale(rect.height)))
            .collect()
    }

    pub fn uno_state(&self) -> &UnoState {
        &self.uno_state
    }

    pub fn can_copy(&self) -> bool {
        self.uno_state.can_copy()
    }

    pub fn can_undo(&self) -> bool {
        self.uno_state.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.uno_state.can_redo()
    }
}
