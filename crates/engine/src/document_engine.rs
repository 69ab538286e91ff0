use model::{Rect, Size, Twips};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Spreadsheet,
    Presentation,
    Drawing,
    Other,
}

impl DocumentKind {
    /// Text documents lay every page out in one part.
    pub fn uses_single_grid(self) -> bool {
        matches!(self, DocumentKind::Text)
    }
}

/// The external document engine.
///
/// Implementations keep a "current view" register that most calls read implicitly;
/// callers reach the engine only through `ViewAccess`, which selects the view and
/// makes the call as one task.
pub trait DocumentEngine: Send + 'static {
    fn create_view(&mut self) -> ViewId;
    fn current_view(&self) -> Option<ViewId>;
    fn set_view(&mut self, view: ViewId);
    fn destroy_view(&mut self, view: ViewId);
    fn views_count(&self) -> usize;

    fn document_kind(&self) -> DocumentKind;
    fn parts(&self) -> usize;
    fn document_size(&self) -> Size<Twips>;
    /// Page rectangles of the current part as `x, y, w, h; ...` in twips.
    fn part_page_rectangles(&self) -> String;

    /// Draws `area` scaled into a `width` x `height` raster of packed BGRA pixels.
    fn paint_tile(&mut self, pixels: &mut [u32], width: u32, height: u32, area: Rect<Twips>);

    fn set_view_language(&mut self, view: ViewId, language: &str);
    fn reset_selection(&mut self);
}
