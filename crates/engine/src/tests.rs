use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use model::{Rect, Size, Twips};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    SetView(ViewId),
    Paint(Option<ViewId>),
}

struct ScriptedEngine {
    current: Option<ViewId>,
    next_view: i32,
    views: Vec<ViewId>,
    calls: Arc<Mutex<Vec<Call>>>,
    paint_delay: Duration,
}

impl ScriptedEngine {
    fn new(calls: Arc<Mutex<Vec<Call>>>) -> Self {
        Self {
            current: None,
            next_view: 0,
            views: Vec::new(),
            calls,
            paint_delay: Duration::ZERO,
        }
    }
}

impl DocumentEngine for ScriptedEngine {
    fn create_view(&mut self) -> ViewId {
        let view = ViewId(self.next_view);
        self.next_view += 1;
        self.views.push(view);
        self.current = Some(view);
        view
    }

    fn current_view(&self) -> Option<ViewId> {
        self.current
    }

    fn set_view(&mut self, view: ViewId) {
        self.current = Some(view);
        self.calls.lock().expect("call log").push(Call::SetView(view));
    }

    fn destroy_view(&mut self, view: ViewId) {
        self.views.retain(|existing| *existing != view);
    }

    fn views_count(&self) -> usize {
        self.views.len()
    }

    fn document_kind(&self) -> DocumentKind {
        DocumentKind::Text
    }

    fn parts(&self) -> usize {
        1
    }

    fn document_size(&self) -> Size<Twips> {
        Size::new(12240, 15840)
    }

    fn part_page_rectangles(&self) -> String {
        "0, 0, 12240, 15840".to_owned()
    }

    fn paint_tile(&mut self, pixels: &mut [u32], _width: u32, _height: u32, _area: Rect<Twips>) {
        thread::sleep(self.paint_delay);
        pixels.fill(0xffff_ffff);
        self.calls
            .lock()
            .expect("call log")
            .push(Call::Paint(self.current));
    }

    fn set_view_language(&mut self, _view: ViewId, _language: &str) {}

    fn reset_selection(&mut self) {}
}

#[test]
fn each_call_runs_right_after_its_view_selection() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sequence = EngineSequence::spawn(ScriptedEngine::new(calls.clone())).expect("spawn");
    let access = sequence.access();
    let first = access.create_view().expect("first view");
    let second = access.create_view().expect("second view");

    let workers: Vec<_> = [first, second]
        .into_iter()
        .map(|view| {
            let access = access.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    access
                        .with_view(view, |engine| {
                            let mut pixels = [0u32; 4];
                            engine.paint_tile(&mut pixels, 2, 2, Rect::new(0, 0, 30, 30));
                        })
                        .expect("sequence alive");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let calls = calls.lock().expect("call log");
    assert_eq!(calls.len(), 200);
    for pair in calls.chunks(2) {
        match pair {
            [Call::SetView(selected), Call::Paint(painted)] => {
                assert_eq!(Some(*selected), *painted)
            }
            other => panic!("unexpected call order: {other:?}"),
        }
    }
}

#[test]
fn view_lifecycle_round_trips() {
    let sequence =
        EngineSequence::spawn(ScriptedEngine::new(Arc::default())).expect("spawn");
    let access = sequence.access();
    let view = access.create_view().expect("view");
    assert_eq!(access.current_view().expect("current"), Some(view));
    assert_eq!(access.views_count().expect("count"), 1);
    let size = access
        .with_view(view, |engine| engine.document_size())
        .expect("size");
    assert_eq!(size, Size::new(12240, 15840));
    access.destroy_view(view).expect("destroy");
    assert_eq!(access.views_count().expect("count"), 0);
}

#[test]
fn dispatched_call_can_outlive_the_deadline() {
    let mut engine = ScriptedEngine::new(Arc::default());
    engine.paint_delay = Duration::from_millis(100);
    let sequence = EngineSequence::spawn(engine).expect("spawn");
    let access = sequence.access();
    let view = access.create_view().expect("view");

    let pending = access
        .dispatch_with_view(view, |engine| {
            let mut pixels = vec![0u32; 16];
            engine.paint_tile(&mut pixels, 4, 4, Rect::new(0, 0, 60, 60));
            pixels
        })
        .expect("dispatch");
    assert_eq!(pending.wait_until(Instant::now()).expect("alive"), None);

    let pixels = pending
        .wait_until(Instant::now() + Duration::from_secs(5))
        .expect("alive")
        .expect("finished");
    assert!(pixels.iter().all(|&pixel| pixel == 0xffff_ffff));
}

#[test]
fn calls_after_shutdown_report_closed_sequence() {
    let sequence =
        EngineSequence::spawn(ScriptedEngine::new(Arc::default())).expect("spawn");
    let access = sequence.access();
    drop(sequence);
    assert_eq!(access.create_view(), Err(EngineError::SequenceClosed));
    assert_eq!(
        access.post_with_view(ViewId(0), |_| {}),
        Err(EngineError::SequenceClosed)
    );
}
