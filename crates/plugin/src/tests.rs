use std::sync::atomic::Ordering;
use std::time::Duration;

use callback::{DecodedPayload, EventType};
use document::MountMode;
use engine::{DocumentKind, EngineSequence, ViewId};
use model::{CssPx, DevicePx, Point, PointF, Rect, Size, Twips};
use renderer::PaintConfig;

use crate::test_utils::{FakeEngine, FakeEngineStats, TILE_COLOR, letter, wait_for};
use crate::{HostEvent, OfficePlugin, PluginConfig};

fn viewport_rect() -> Rect<CssPx> {
    Rect::new(0, 0, 100, 100)
}

fn mounted(
    engine: FakeEngine,
    config: PluginConfig,
) -> (EngineSequence<FakeEngine>, OfficePlugin<FakeEngine>) {
    let sequence = EngineSequence::spawn(engine).expect("spawn engine");
    let mut plugin = OfficePlugin::new(config);
    plugin
        .on_viewport_changed(viewport_rect(), 1.0)
        .expect("viewport");
    plugin
        .render_document(sequence.access(), MountMode::CreateView)
        .expect("render document");
    (sequence, plugin)
}

fn text_plugin() -> (
    EngineSequence<FakeEngine>,
    OfficePlugin<FakeEngine>,
    FakeEngineStats,
) {
    let (engine, stats) = FakeEngine::text();
    let (sequence, plugin) = mounted(engine, config_with_budget(Duration::from_secs(1)));
    (sequence, plugin, stats)
}

fn config_with_budget(budget: Duration) -> PluginConfig {
    PluginConfig {
        paint: PaintConfig {
            budget,
            ..PaintConfig::default()
        },
        ..PluginConfig::default()
    }
}

/// Short enough for a gated paint to miss it.
fn slow_paint_config() -> PluginConfig {
    config_with_budget(Duration::from_millis(50))
}

fn paint_count(stats: &FakeEngineStats) -> usize {
    stats.paint_count.load(Ordering::SeqCst)
}

fn invalidate(plugin: &OfficePlugin<FakeEngine>, payload: &str) {
    assert!(
        plugin
            .callback_sink()
            .deliver_text(EventType::InvalidateTiles.code(), payload)
    );
}

#[test]
fn render_document_prepares_view() {
    let (_sequence, plugin, stats) = text_plugin();

    assert!(plugin.is_mounted());
    assert_eq!(stats.views(), vec![ViewId(0)]);
    let log = stats.log.lock().expect("engine log");
    assert_eq!(log.languages, vec![(ViewId(0), "en-US".to_owned())]);
    assert_eq!(log.reset_selection_count, 1);
    drop(log);

    let grids = plugin.state().pipeline().grids();
    assert_eq!(grids.len(), 1);
    assert_eq!(grids.grid(0).document_size(), letter());
    assert_eq!(
        plugin.state().viewport().available_area(),
        Rect::<DevicePx>::new(0, 0, 100, 100)
    );
}

#[test]
fn first_paint_clears_and_renders_visible_tiles() {
    let (_sequence, mut plugin, stats) = text_plugin();

    let result = plugin.paint();

    assert!(result.cleared);
    assert!(result.pending.is_empty());
    assert!(result.ready.contains(&Rect::new(0, 0, 100, 100)));
    assert_eq!(paint_count(&stats), 1);
    assert_eq!(plugin.surface().pixel(10, 10), Some(TILE_COLOR));
    assert!(!plugin.needs_paint());

    let again = plugin.paint();
    assert!(again.ready.is_empty() && again.pending.is_empty());
    assert_eq!(paint_count(&stats), 1);
}

#[test]
fn invalidated_rect_is_rendered_again() {
    let (_sequence, mut plugin, stats) = text_plugin();
    plugin.paint();

    invalidate(&plugin, "0, 0, 1500, 1500");
    plugin.pump();

    assert!(plugin.needs_paint());
    assert!(!plugin.state().pipeline().grids().grid(0).is_valid(0));
    let result = plugin.paint();
    assert_eq!(result.ready, vec![Rect::new(0, 0, 100, 100)]);
    assert_eq!(paint_count(&stats), 2);
}

#[test]
fn empty_payload_invalidates_whole_part() {
    let (_sequence, mut plugin, stats) = text_plugin();
    plugin.paint();

    invalidate(&plugin, "EMPTY");
    plugin.pump();

    assert_eq!(plugin.state().pipeline().grids().grid(0).valid_count(), 0);
    plugin.paint();
    assert_eq!(paint_count(&stats), 2);
}

#[test]
fn first_invalidation_reports_ready_with_buffered_state() {
    let (_sequence, mut plugin, _stats) = text_plugin();
    let sink = plugin.callback_sink();
    sink.deliver_text(EventType::StateChanged.code(), ".uno:Undo=enabled");
    sink.deliver_text(EventType::InvalidateTiles.code(), "0, 0, 100, 100");
    sink.deliver_text(EventType::InvalidateTiles.code(), "0, 0, 100, 100");

    plugin.pump();

    assert_eq!(
        plugin.take_host_events(),
        vec![HostEvent::Ready {
            state_changes: vec![DecodedPayload::RawString(".uno:Undo=enabled".to_owned())],
        }]
    );
    assert!(plugin.can_undo());
    assert!(!plugin.can_redo());

    sink.deliver_text(EventType::StateChanged.code(), ".uno:Redo=enabled");
    sink.deliver_text(EventType::InvalidateTiles.code(), "EMPTY");
    plugin.pump();
    assert!(plugin.take_host_events().is_empty());
    assert!(plugin.can_redo());
}

#[test]
fn scrolling_reuses_rendered_tiles() {
    let (_sequence, mut plugin, stats) = text_plugin();
    plugin.paint();

    plugin
        .update_scroll(PointF::new(0.0, 50.0))
        .expect("scroll");

    assert_eq!(
        plugin.state().viewport().scroll_position(),
        Point::<DevicePx>::new(0, 50)
    );
    assert_eq!(plugin.state().pipeline().frame().scroll, Point::new(0, 50));
    let result = plugin.paint();
    assert_eq!(result.ready, vec![Rect::new(0, 50, 100, 50)]);
    assert_eq!(paint_count(&stats), 1);
}

#[test]
fn scroll_is_clamped_to_document() {
    let (_sequence, mut plugin, _stats) = text_plugin();

    plugin
        .update_scroll(PointF::new(-20.0, 5000.0))
        .expect("scroll");

    // 1056 css px tall document in a 100 px viewport.
    assert_eq!(
        plugin.state().viewport().scroll_position(),
        Point::<DevicePx>::new(0, 956)
    );
}

#[test]
fn late_render_is_applied_on_pump() {
    let (engine, stats) = FakeEngine::gated(DocumentKind::Text);
    let (_sequence, mut plugin) = mounted(engine, slow_paint_config());

    let first = plugin.paint();
    assert!(first.ready.contains(&Rect::new(0, 0, 100, 100)));
    assert_eq!(first.pending, vec![Rect::new(0, 0, 100, 100)]);
    assert_eq!(plugin.late_render_count(), 1);

    stats.release.send(()).expect("release paint");
    assert!(wait_for(|| {
        plugin.pump();
        plugin.late_render_count() == 0
    }));
    assert!(plugin.state().pipeline().grids().grid(0).is_valid(0));

    let second = plugin.paint();
    assert!(second.pending.is_empty());
    assert_eq!(plugin.surface().pixel(5, 5), Some(TILE_COLOR));
    assert_eq!(paint_count(&stats), 1);
}

#[test]
fn late_render_for_invalidated_tile_is_discarded() {
    let (engine, stats) = FakeEngine::gated(DocumentKind::Text);
    let (_sequence, mut plugin) = mounted(engine, slow_paint_config());
    plugin.paint();
    assert_eq!(plugin.late_render_count(), 1);

    invalidate(&plugin, "EMPTY");
    plugin.pump();
    stats.release.send(()).expect("release paint");
    assert!(wait_for(|| {
        plugin.pump();
        plugin.late_render_count() == 0
    }));
    assert!(!plugin.state().pipeline().grids().grid(0).is_valid(0));

    stats.release.send(()).expect("release paint");
    let result = plugin.paint();
    assert!(result.pending.is_empty());
    assert_eq!(paint_count(&stats), 2);
}

#[test]
fn document_size_change_rebuilds_grid() {
    let (_sequence, mut plugin, stats) = text_plugin();
    plugin.paint();
    let generation = plugin.state().pipeline().grids().grid(0).generation();

    let taller = Size::<Twips>::new(12240, 31680);
    stats.set_document_size(taller);
    plugin
        .callback_sink()
        .deliver_text(EventType::DocumentSizeChanged.code(), "12240, 31680");
    plugin.pump();

    let grid = plugin.state().pipeline().grids().grid(0);
    assert_eq!(grid.document_size(), taller);
    assert_ne!(grid.generation(), generation);
    assert!(plugin.needs_paint());
}

#[test]
fn device_scale_change_rebuilds_grid_and_surface() {
    let (_sequence, mut plugin, _stats) = text_plugin();
    plugin.paint();
    let generation = plugin.state().pipeline().grids().grid(0).generation();

    let change = plugin
        .on_viewport_changed(viewport_rect(), 2.0)
        .expect("viewport");

    assert!(change.scale_changed());
    assert_eq!(plugin.surface().size(), Size::new(200, 200));
    let grid = plugin.state().pipeline().grids().grid(0);
    assert_ne!(grid.generation(), generation);
    assert_eq!(grid.scale(), plugin.state().viewport().total_scale());
    let result = plugin.paint();
    assert!(result.cleared);
}

#[test]
fn zoom_change_rebuilds_grid() {
    let (_sequence, mut plugin, _stats) = text_plugin();
    let generation = plugin.state().pipeline().grids().grid(0).generation();

    plugin.set_zoom(2.0).expect("zoom");

    let grid = plugin.state().pipeline().grids().grid(0);
    assert_ne!(grid.generation(), generation);
    assert!(plugin.set_zoom(0.0).is_err());
}

#[test]
fn zoom_out_after_scroll_repaints_inside_document() {
    let (_sequence, mut plugin, _stats) = text_plugin();
    plugin.set_zoom(2.0).expect("zoom");
    plugin
        .update_scroll(PointF::new(0.0, 4000.0))
        .expect("scroll");
    plugin.paint();

    plugin.set_zoom(0.125).expect("zoom");

    // 102 x 132 device px at zoom 0.125.
    let viewport = plugin.state().viewport();
    assert_eq!(viewport.scroll_position(), Point::<DevicePx>::new(0, 32));
    assert_eq!(plugin.state().pipeline().frame().scroll, Point::new(0, 32));
    let result = plugin.paint();
    assert!(result.pending.is_empty());
    assert!(result.ready.contains(&Rect::new(0, 0, 100, 100)));
    assert_eq!(plugin.surface().pixel(50, 99), Some(TILE_COLOR));
}

#[test]
fn invalidation_of_hidden_part_leaves_surface_alone() {
    let (engine, _stats) = FakeEngine::new(DocumentKind::Spreadsheet, 3);
    let (_sequence, mut plugin) = mounted(engine, config_with_budget(Duration::from_secs(1)));
    assert_eq!(plugin.state().pipeline().grids().len(), 3);
    plugin.paint();
    plugin.select_part(1).expect("select part");
    plugin.paint();
    assert_eq!(plugin.state().pipeline().grids().grid(1).valid_count(), 1);

    invalidate(&plugin, "0, 0, 1500, 1500, 0");
    plugin.pump();

    let grids = plugin.state().pipeline().grids();
    assert_eq!(grids.grid(0).valid_count(), 0);
    assert_eq!(grids.grid(1).valid_count(), 1);
    assert!(!plugin.needs_paint());
}

#[test]
fn forwarded_callbacks_reach_host() {
    let (engine, _stats) = FakeEngine::text();
    let sequence = EngineSequence::spawn(engine).expect("spawn engine");
    let mut plugin = OfficePlugin::new(config_with_budget(Duration::from_secs(1)));
    plugin.forward(EventType::TextSelection);
    plugin
        .render_document(sequence.access(), MountMode::CreateView)
        .expect("render document");

    plugin
        .callback_sink()
        .deliver_text(EventType::TextSelection.code(), "10,10,5,5;20,20,5,5;");
    plugin.pump();

    let events = plugin.take_host_events();
    assert_eq!(events.len(), 1);
    let HostEvent::Callback { event, payload } = &events[0] else {
        panic!("expected forwarded callback, got {events:?}");
    };
    assert_eq!(event.code, EventType::TextSelection.code());
    assert_eq!(
        payload,
        &DecodedPayload::NumericMatrix(vec![vec![10, 10, 5, 5], vec![20, 20, 5, 5]])
    );
}

#[test]
fn overflowing_callbacks_invalidate_everything() {
    let (engine, _stats) = FakeEngine::text();
    let config = PluginConfig {
        event_capacity: 1,
        ..config_with_budget(Duration::from_secs(1))
    };
    let (_sequence, mut plugin) = mounted(engine, config);
    plugin.paint();
    let sink = plugin.callback_sink();

    assert!(sink.deliver_text(EventType::StateChanged.code(), ".uno:Bold=true"));
    assert!(!sink.deliver_text(EventType::InvalidateTiles.code(), "0, 0, 15, 15"));
    plugin.pump();

    assert_eq!(plugin.state().pipeline().grids().grid(0).valid_count(), 0);
    assert!(plugin.needs_paint());
}

#[test]
fn dropped_size_change_is_recovered_after_overflow() {
    let (engine, stats) = FakeEngine::text();
    let config = PluginConfig {
        event_capacity: 1,
        ..config_with_budget(Duration::from_secs(1))
    };
    let (_sequence, mut plugin) = mounted(engine, config);
    plugin.paint();
    let generation = plugin.state().pipeline().grids().grid(0).generation();
    let sink = plugin.callback_sink();

    let taller = Size::<Twips>::new(12240, 31680);
    stats.set_document_size(taller);
    assert!(sink.deliver_text(EventType::StateChanged.code(), ".uno:Bold=true"));
    assert!(!sink.deliver_text(EventType::DocumentSizeChanged.code(), "12240, 31680"));
    plugin.pump();

    let grid = plugin.state().pipeline().grids().grid(0);
    assert_eq!(grid.document_size(), taller);
    assert_ne!(grid.generation(), generation);
    plugin
        .update_scroll(PointF::new(0.0, 5000.0))
        .expect("scroll");
    assert_eq!(
        plugin.state().viewport().scroll_position(),
        Point::<DevicePx>::new(0, 2012)
    );
}

#[test]
fn unmount_releases_view_and_cache() {
    let (_sequence, mut plugin, stats) = text_plugin();
    plugin.paint();

    plugin.unmount().expect("unmount");

    assert!(!plugin.is_mounted());
    assert!(stats.views().is_empty());
    assert!(plugin.state().pipeline().grids().is_empty());
    invalidate(&plugin, "EMPTY");
    plugin.pump();
    assert_eq!(plugin.paint(), Default::default());
    assert!(plugin.update_scroll(PointF::new(0.0, 10.0)).is_err());
}

#[test]
fn rendering_another_document_replaces_view() {
    let (_sequence, mut plugin, stats) = text_plugin();
    let (other_engine, other_stats) = FakeEngine::text();
    let other = EngineSequence::spawn(other_engine).expect("spawn engine");

    plugin
        .render_document(other.access(), MountMode::ReuseCurrentView)
        .expect("render document");

    assert!(stats.views().is_empty());
    assert_eq!(other_stats.views(), vec![ViewId(0)]);
    plugin.paint();
    assert_eq!(paint_count(&other_stats), 1);
    plugin.unmount().expect("unmount");
}

#[test]
fn surface_points_map_to_twips() {
    let (_sequence, mut plugin, _stats) = text_plugin();
    plugin
        .update_scroll(PointF::new(0.0, 10.0))
        .expect("scroll");

    assert_eq!(
        plugin.surface_point_to_twips(PointF::new(10.0, 10.0)),
        Some(Point::new(150, 300))
    );
    assert_eq!(plugin.surface_point_to_twips(PointF::new(150.0, 10.0)), None);
}
