//! Resize and move math for object drags.
//!
//! [`drag_bounds`] maps the pointer displacement since drag start onto new
//! object bounds. It is a pure function of the starting bounds, so replaying
//! the same pointer position always yields the same rectangle.
//!
//! - Corner handles scale uniformly from the opposite corner using the
//!   largest outward displacement, keeping `w / h` fixed.
//! - Edge handles move one edge; the orthogonal dimension never changes.
//! - `Move` translates without resizing.
//!
//! Neither dimension drops below [`MIN_OBJECT_SIZE`]. After sizing, each
//! edge on the dragged axis snaps onto a grid line within [`SNAP_TOLERANCE`]
//! on its own, the static edge included, unless the snap would cross the size
//! floor. Corner drags only snap horizontally; the height follows from the
//! aspect ratio. A move shifts the object so its nearer edge lands on a line.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use crate::consts::{MIN_OBJECT_SIZE, SNAP_TOLERANCE};
use crate::doc::Bounds;
use crate::hit::DragDirection;
use crate::viewport::BoardPoint;

/// Offset that moves `v` onto the nearest multiple of `cell`, if within tolerance.
#[must_use]
pub fn snap_delta(v: f64, cell: f64) -> Option<f64> {
    if cell <= 0.0 {
        return None;
    }
    let d = (v / cell).round() * cell - v;
    (d.abs() < SNAP_TOLERANCE).then_some(d)
}

/// New bounds for a drag in `dir` from `origin` to `pointer`.
#[must_use]
pub fn drag_bounds(dir: DragDirection, start: &Bounds, origin: BoardPoint, pointer: BoardPoint, cell: f64) -> Bounds {
    let dx = pointer.x - origin.x;
    let dy = pointer.y - origin.y;
    match dir {
        DragDirection::Move => translate(start, dx, dy, cell),
        DragDirection::Left | DragDirection::Right => {
            let (x, w) = resize_axis(start.x, start.w, dx, dir.moves_left(), cell);
            Bounds::new(x, start.y, w, start.h)
        }
        DragDirection::Top | DragDirection::Bottom => {
            let (y, h) = resize_axis(start.y, start.h, dy, dir.moves_top(), cell);
            Bounds::new(start.x, y, start.w, h)
        }
        DragDirection::TopLeft | DragDirection::TopRight | DragDirection::BottomRight | DragDirection::BottomLeft => {
            resize_corner(dir, start, dx, dy, cell)
        }
    }
}

fn translate(start: &Bounds, dx: f64, dy: f64, cell: f64) -> Bounds {
    let x = start.x + dx + nearest_snap(start.x + dx, start.w, cell);
    let y = start.y + dy + nearest_snap(start.y + dy, start.h, cell);
    Bounds::new(x, y, start.w, start.h)
}

/// Shift that puts whichever edge of `pos..pos + len` is closer to a grid
/// line onto it. Zero when neither edge is in tolerance.
fn nearest_snap(pos: f64, len: f64, cell: f64) -> f64 {
    match (snap_delta(pos, cell), snap_delta(pos + len, cell)) {
        (Some(a), Some(b)) if b.abs() < a.abs() => b,
        (Some(a), _) => a,
        (None, Some(b)) => b,
        (None, None) => 0.0,
    }
}

/// Snap both edges of `pos..pos + len` independently. An edge that would
/// push `len` below `floor` stays where it is.
fn snap_span(mut pos: f64, mut len: f64, floor: f64, cell: f64) -> (f64, f64) {
    if let Some(d) = snap_delta(pos, cell) {
        if len - d >= floor {
            pos += d;
            len -= d;
        }
    }
    if let Some(d) = snap_delta(pos + len, cell) {
        if len + d >= floor {
            len += d;
        }
    }
    (pos, len)
}

/// One-axis edge resize. `near` means the low edge (left/top) follows the
/// pointer and the far edge stays put.
fn resize_axis(pos: f64, len: f64, delta: f64, near: bool, cell: f64) -> (f64, f64) {
    if near {
        let far = pos + len;
        let len = (len - delta).max(MIN_OBJECT_SIZE);
        snap_span(far - len, len, MIN_OBJECT_SIZE, cell)
    } else {
        snap_span(pos, (len + delta).max(MIN_OBJECT_SIZE), MIN_OBJECT_SIZE, cell)
    }
}

fn resize_corner(dir: DragDirection, start: &Bounds, dx: f64, dy: f64, cell: f64) -> Bounds {
    let aspect = if start.h > 0.0 { start.w / start.h } else { 1.0 };
    let min_w = MIN_OBJECT_SIZE * aspect.max(1.0);

    let sx = if dir.moves_left() { -dx } else { dx };
    let sy = if dir.moves_top() { -dy } else { dy };
    let w = (start.w + sx.max(sy)).max(min_w);
    let x = if dir.moves_left() { start.right() - w } else { start.x };
    let (x, w) = snap_span(x, w, min_w, cell);

    let h = w / aspect;
    let y = if dir.moves_top() { start.bottom() - h } else { start.y };
    Bounds::new(x, y, w, h)
}
