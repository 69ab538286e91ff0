//! Fake document engine for plugin tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use engine::{DocumentEngine, DocumentKind, ViewId};
use model::{Rect, Size, Twips};

pub const TILE_COLOR: u32 = 0xff20_4060;

/// Letter page, 816 x 1056 css px at zoom 1.
pub fn letter() -> Size<Twips> {
    Size::new(12240, 15840)
}

#[derive(Debug)]
pub struct FakeEngineLog {
    pub document_size: Size<Twips>,
    pub views: Vec<ViewId>,
    pub languages: Vec<(ViewId, String)>,
    pub reset_selection_count: usize,
    pub painted: Vec<(Option<ViewId>, Rect<Twips>)>,
}

pub struct FakeEngineStats {
    pub log: Arc<Mutex<FakeEngineLog>>,
    pub paint_count: Arc<AtomicUsize>,
    /// One message lets one gated paint finish.
    pub release: Sender<()>,
}

impl FakeEngineStats {
    pub fn painted_areas(&self) -> Vec<Rect<Twips>> {
        self.log
            .lock()
            .expect("engine log")
            .painted
            .iter()
            .map(|(_, area)| *area)
            .collect()
    }

    pub fn views(&self) -> Vec<ViewId> {
        self.log.lock().expect("engine log").views.clone()
    }

    pub fn set_document_size(&self, size: Size<Twips>) {
        self.log.lock().expect("engine log").document_size = size;
    }
}

pub struct FakeEngine {
    kind: DocumentKind,
    parts: usize,
    page_rects: String,
    current: Option<ViewId>,
    next_view: i32,
    gate: Option<Receiver<()>>,
    log: Arc<Mutex<FakeEngineLog>>,
    paint_count: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn new(kind: DocumentKind, parts: usize) -> (Self, FakeEngineStats) {
        let (mut engine, stats) = Self::build(kind, parts);
        engine.gate = None;
        (engine, stats)
    }

    pub fn text() -> (Self, FakeEngineStats) {
        Self::new(DocumentKind::Text, 1)
    }

    /// Paints block until `FakeEngineStats::release` is sent to.
    pub fn gated(kind: DocumentKind) -> (Self, FakeEngineStats) {
        Self::build(kind, 1)
    }

    fn build(kind: DocumentKind, parts: usize) -> (Self, FakeEngineStats) {
        let log = Arc::new(Mutex::new(FakeEngineLog {
            document_size: letter(),
            views: Vec::new(),
            languages: Vec::new(),
            reset_selection_count: 0,
            painted: Vec::new(),
        }));
        let paint_count = Arc::new(AtomicUsize::new(0));
        let (release, gate) = unbounded();
        let engine = Self {
            kind,
            parts,
            page_rects: "0, 0, 12240, 15840".to_owned(),
            current: None,
            next_view: 0,
            gate: Some(gate),
            log: Arc::clone(&log),
            paint_count: Arc::clone(&paint_count),
        };
        let stats = FakeEngineStats {
            log,
            paint_count,
            release,
        };
        (engine, stats)
    }
}

impl DocumentEngine for FakeEngine {
    fn create_view(&mut self) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;
        self.log.lock().expect("engine log").views.push(view);
        self.current = Some(view);
        view
    }

    fn current_view(&self) -> Option<ViewId> {
        self.current
    }

    fn set_view(&mut self, view: ViewId) {
        self.current = Some(view);
    }

    fn destroy_view(&mut self, view: ViewId) {
        let mut log = self.log.lock().expect("engine log");
        log.views.retain(|existing| *existing != view);
        if self.current == Some(view) {
            self.current = log.views.first().copied();
        }
    }

    fn views_count(&self) -> usize {
        self.log.lock().expect("engine log").views.len()
    }

    fn document_kind(&self) -> DocumentKind {
        self.kind
    }

    fn parts(&self) -> usize {
        self.parts
    }

    fn document_size(&self) -> Size<Twips> {
        self.log.lock().expect("engine log").document_size
    }

    fn part_page_rectangles(&self) -> String {
        self.page_rects.clone()
    }

    fn paint_tile(&mut self, pixels: &mut [u32], _width: u32, _height: u32, area: Rect<Twips>) {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        pixels.fill(TILE_COLOR);
        self.paint_count.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .expect("engine log")
            .painted
            .push((self.current, area));
    }

    fn set_view_language(&mut self, view: ViewId, language: &str) {
        self.log
            .lock()
            .expect("engine log")
            .languages
            .push((view, language.to_owned()));
    }

    fn reset_selection(&mut self) {
        self.log.lock().expect("engine log").reset_selection_count += 1;
    }
}

/// Polls `condition` until it holds or a second has passed.
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(1);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
