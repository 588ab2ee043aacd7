#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::surface::{DrawCommand, RecordingSurface};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn board_approx_eq(a: BoardPoint, b: BoardPoint) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0, 64.0, 0.1)
}

// --- Coordinates ---

#[test]
fn identity_transform_maps_screen_to_board_unchanged() {
    let vp = viewport();
    let p = vp.transform(ScreenPoint::new(130.0, 70.0));
    assert_eq!(p, BoardPoint::new(130.0, 70.0));
}

#[test]
fn transform_divides_out_scale_after_translation() {
    let mut vp = viewport();
    vp.pan_by(ScreenDelta::new(100.0, 50.0));
    vp.zoom_at(ScreenPoint::new(100.0, 50.0), 10.0);
    let s = vp.scale();
    let p = vp.transform(ScreenPoint::new(100.0 + 2.0 * s, 50.0 + 3.0 * s));
    assert!(board_approx_eq(p, BoardPoint::new(2.0, 3.0)));
}

#[test]
fn screen_board_round_trip_holds_for_many_transforms() {
    let mut vp = viewport();
    let points = [
        BoardPoint::new(0.0, 0.0),
        BoardPoint::new(-321.5, 88.25),
        BoardPoint::new(1e4, -7.0),
    ];
    for (pan, steps) in [(-40.0, 3.0), (250.0, -5.0), (13.0, 11.0)] {
        vp.pan_by(ScreenDelta::new(pan, -pan / 2.0));
        vp.zoom_at(ScreenPoint::new(pan, pan), steps);
        for p in points {
            let back = vp.transform(vp.to_screen(p));
            assert!((back.x - p.x).abs() < 1e-6 && (back.y - p.y).abs() < 1e-6, "{p:?} -> {back:?}");
        }
    }
}

#[test]
fn snap_to_grid_floors_to_cell() {
    let vp = viewport();
    assert_eq!(vp.snap_to_grid(BoardPoint::new(130.0, 64.0)), BoardPoint::new(128.0, 64.0));
    assert_eq!(vp.snap_to_grid(BoardPoint::new(63.9, 0.1)), BoardPoint::new(0.0, 0.0));
    assert_eq!(vp.snap_to_grid(BoardPoint::new(-1.0, -64.0)), BoardPoint::new(-64.0, -64.0));
}

#[test]
fn snap_to_grid_is_idempotent() {
    let vp = viewport();
    for p in [BoardPoint::new(17.0, -300.5), BoardPoint::new(640.0, 1.0), BoardPoint::new(-0.001, 99.0)] {
        let once = vp.snap_to_grid(p);
        assert_eq!(vp.snap_to_grid(once), once);
    }
}

#[test]
fn non_positive_cell_size_falls_back_to_default() {
    let vp = Viewport::new(100.0, 100.0, 0.0, -1.0);
    assert_eq!(vp.cell_size(), DEFAULT_CELL_SIZE);
    assert_eq!(vp.zoom_step(), DEFAULT_ZOOM_STEP);
}

// --- Zoom / pan ---

#[test]
fn zoom_in_multiplies_scale_by_exp_step() {
    let mut vp = viewport();
    vp.zoom_at(ScreenPoint::new(0.0, 0.0), 1.0);
    assert!(approx_eq(vp.scale(), 0.1_f64.exp()));
    vp.zoom_at(ScreenPoint::new(0.0, 0.0), -1.0);
    assert!(approx_eq(vp.scale(), 1.0));
}

#[test]
fn board_point_under_cursor_is_invariant_across_two_zooms() {
    let mut vp = Viewport::new(800.0, 600.0, 64.0, 0.4);
    vp.pan_by(ScreenDelta::new(-37.0, 12.0));
    let cursor = ScreenPoint::new(400.0, 300.0);
    let before = vp.transform(cursor);

    vp.zoom_at(cursor, 1.0);
    vp.zoom_at(cursor, 1.0);

    assert!(approx_eq(vp.scale(), 0.8_f64.exp()));
    assert!(board_approx_eq(vp.transform(cursor), before));
}

#[test]
fn zoom_out_stops_at_floor_and_keeps_grid_bounded() {
    let mut vp = viewport();
    let cursor = ScreenPoint::new(400.0, 300.0);
    let anchor = vp.transform(cursor);
    for _ in 0..300 {
        vp.zoom_at(cursor, -1.0);
    }
    assert_eq!(vp.scale(), MIN_SCALE);
    assert!(board_approx_eq(vp.transform(cursor), anchor));

    let span = vp.grid_span();
    let lines = (span.cols.end() - span.cols.start()) + (span.rows.end() - span.rows.start());
    assert!(lines < 1_000, "{span:?}");

    // Already at the floor: nothing moves, nothing repaints.
    vp.repaint().take();
    let translation = vp.translation();
    vp.zoom_at(ScreenPoint::new(10.0, 10.0), -1.0);
    assert_eq!(vp.translation(), translation);
    assert!(!vp.repaint().is_requested());
}

#[test]
fn zoom_in_stops_at_ceiling() {
    let mut vp = viewport();
    let cursor = ScreenPoint::new(100.0, 100.0);
    for _ in 0..300 {
        vp.zoom_at(cursor, 1.0);
    }
    assert_eq!(vp.scale(), MAX_SCALE);
    assert!(board_approx_eq(vp.transform(cursor), BoardPoint::new(100.0, 100.0)));
}

#[test]
fn pan_adds_raw_screen_delta() {
    let mut vp = viewport();
    vp.zoom_at(ScreenPoint::new(0.0, 0.0), 4.0);
    vp.pan_by(ScreenDelta::new(15.0, -5.0));
    vp.pan_by(ScreenDelta::new(5.0, 5.0));
    assert_eq!(vp.translation(), ScreenPoint::new(20.0, 0.0));
}

#[test]
fn reset_view_restores_identity() {
    let mut vp = viewport();
    vp.pan_by(ScreenDelta::new(15.0, -5.0));
    vp.zoom_at(ScreenPoint::new(10.0, 10.0), 2.0);
    vp.reset_view();
    assert_eq!(vp.scale(), 1.0);
    assert_eq!(vp.translation(), ScreenPoint::default());
}

#[test]
fn mutations_raise_repaint_and_render_lowers_it() {
    let mut vp = viewport();
    let mut surface = RecordingSurface::new();
    vp.render(&mut surface);
    assert!(!vp.repaint().is_requested());

    vp.pan_by(ScreenDelta::new(1.0, 0.0));
    assert!(vp.repaint().is_requested());
    vp.render(&mut surface);
    assert!(!vp.repaint().is_requested());

    vp.resize(1024.0, 768.0);
    assert!(vp.repaint().take());
    assert!(!vp.repaint().take());
}

// --- Grid ---

#[test]
fn grid_span_covers_viewport_without_translation() {
    let vp = viewport();
    let span = vp.grid_span();
    assert_eq!(span.cols, 0..=13);
    assert_eq!(span.rows, 0..=10);
}

#[test]
fn grid_span_overscans_by_translation_in_cells() {
    let mut vp = viewport();
    vp.pan_by(ScreenDelta::new(130.0, -70.0));
    let span = vp.grid_span();
    assert_eq!(span.cols, -3..=16);
    assert_eq!(span.rows, -2..=12);

    // The visible board area lies inside the drawn grid.
    let top_left = vp.transform(ScreenPoint::new(0.0, 0.0));
    let bottom_right = vp.transform(ScreenPoint::new(800.0, 600.0));
    assert!(top_left.x >= -3.0 * 64.0 && bottom_right.x <= 16.0 * 64.0);
    assert!(top_left.y >= -2.0 * 64.0 && bottom_right.y <= 12.0 * 64.0);
}

// --- Rendering ---

#[test]
fn render_clears_then_applies_transform() {
    let mut vp = viewport();
    vp.pan_by(ScreenDelta::new(10.0, 20.0));
    let mut surface = RecordingSurface::new();
    vp.render(&mut surface);

    let cmds = surface.commands();
    assert_eq!(cmds[0], DrawCommand::SetTransform { scale: 1.0, tx: 0.0, ty: 0.0 });
    assert_eq!(cmds[1], DrawCommand::Clear { width: 800.0, height: 600.0 });
    assert_eq!(cmds[2], DrawCommand::SetTransform { scale: 1.0, tx: 10.0, ty: 20.0 });
    assert!(surface.count(|c| matches!(c, DrawCommand::Stroke)) >= 1);
}

#[test]
fn render_invokes_listeners_in_descending_depth() {
    let vp = viewport();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    let _tokens = vp.add_render_listener("TokenManagerRender", 0, move |_, _| l.borrow_mut().push("tokens"));
    let l = Rc::clone(&log);
    let _objects = vp.add_render_listener("ObjManagerRender", 1, move |_, _| l.borrow_mut().push("objects"));

    vp.render(&mut RecordingSurface::new());
    assert_eq!(*log.borrow(), vec!["objects", "tokens"]);
}

#[test]
fn registering_same_listener_key_twice_paints_once() {
    let vp = viewport();
    let count = Rc::new(RefCell::new(0));

    let c = Rc::clone(&count);
    let _first = vp.add_render_listener("layer", 0, move |_, _| *c.borrow_mut() += 1);
    let c = Rc::clone(&count);
    let _second = vp.add_render_listener("layer", 0, move |_, _| *c.borrow_mut() += 10);

    vp.render(&mut RecordingSurface::new());
    assert_eq!(*count.borrow(), 10);
    assert_eq!(vp.listener_keys(), vec!["layer"]);
}

#[test]
fn listeners_receive_cell_size_and_scale() {
    let mut vp = viewport();
    vp.zoom_at(ScreenPoint::new(0.0, 0.0), 2.0);
    let seen = Rc::new(RefCell::new(None));
    let s = Rc::clone(&seen);
    let _sub = vp.add_render_listener("probe", 0, move |_, pass| *s.borrow_mut() = Some(*pass));

    vp.render(&mut RecordingSurface::new());
    let pass = seen.borrow().expect("listener ran");
    assert_eq!(pass.cell_size, 64.0);
    assert!(approx_eq(pass.scale, 0.2_f64.exp()));
}

#[test]
fn dropped_listener_no_longer_paints() {
    let vp = viewport();
    let count = Rc::new(RefCell::new(0));
    let c = Rc::clone(&count);
    let sub = vp.add_render_listener("layer", 0, move |_, _| *c.borrow_mut() += 1);
    vp.render(&mut RecordingSurface::new());
    drop(sub);
    vp.render(&mut RecordingSurface::new());
    assert_eq!(*count.borrow(), 1);
}
