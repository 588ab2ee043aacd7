//! Hit-testing for the resize/move handles of a selected object.
//!
//! A selected object shows eight square control points on the 3×3 lattice of
//! its corners and edge midpoints (the centre is excluded). The square side is
//! `CONTROL_SIZE_PX / min(1, scale)` board units, so handles never shrink
//! below their nominal screen size when zoomed out.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::CONTROL_SIZE_PX;
use crate::doc::Bounds;
use crate::input::Cursor;
use crate::viewport::BoardPoint;

/// What a drag on a selected object does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDirection {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    /// Translate without resizing.
    Move,
}

impl DragDirection {
    /// The handle at lattice column `i` and row `j` (each 0..=2).
    /// The centre `(1, 1)` and out-of-range cells map to `None`.
    #[must_use]
    pub fn from_control(i: u8, j: u8) -> Option<Self> {
        match (i, j) {
            (0, 0) => Some(Self::TopLeft),
            (1, 0) => Some(Self::Top),
            (2, 0) => Some(Self::TopRight),
            (2, 1) => Some(Self::Right),
            (2, 2) => Some(Self::BottomRight),
            (1, 2) => Some(Self::Bottom),
            (0, 2) => Some(Self::BottomLeft),
            (0, 1) => Some(Self::Left),
            _ => None,
        }
    }

    /// Corner handles keep the original aspect ratio.
    #[must_use]
    pub fn preserves_aspect(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::BottomRight | Self::BottomLeft)
    }

    /// Whether the left edge follows the pointer (otherwise the right edge does, if any).
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::Left)
    }

    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::Right)
    }

    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::Top)
    }

    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight | Self::Bottom)
    }

    #[must_use]
    pub fn cursor(self) -> Cursor {
        match self {
            Self::TopLeft => Cursor::NwResize,
            Self::Top => Cursor::NResize,
            Self::TopRight => Cursor::NeResize,
            Self::Right => Cursor::EResize,
            Self::BottomRight => Cursor::SeResize,
            Self::Bottom => Cursor::SResize,
            Self::BottomLeft => Cursor::SwResize,
            Self::Left => Cursor::WResize,
            Self::Move => Cursor::Move,
        }
    }
}

/// Side of a control square in board units at the given zoom.
#[must_use]
pub fn control_size(scale: f64) -> f64 {
    CONTROL_SIZE_PX / scale.min(1.0)
}

/// The eight control squares of `bounds`, in lattice scan order.
#[must_use]
pub fn control_squares(bounds: &Bounds, scale: f64) -> Vec<(DragDirection, Bounds)> {
    let size = control_size(scale);
    let mut out = Vec::with_capacity(8);
    for i in 0..3u8 {
        for j in 0..3u8 {
            let Some(dir) = DragDirection::from_control(i, j) else {
                continue;
            };
            let x = bounds.x + bounds.w * f64::from(i) / 2.0 - size / 2.0;
            let y = bounds.y + bounds.h * f64::from(j) / 2.0 - size / 2.0;
            out.push((dir, Bounds::new(x, y, size, size)));
        }
    }
    out
}

/// Which drag `p` would start on a selected object: a control square first,
/// then the body (`Move`).
#[must_use]
pub fn hit_handle(bounds: &Bounds, p: BoardPoint, scale: f64) -> Option<DragDirection> {
    control_squares(bounds, scale)
        .into_iter()
        .find(|(_, square)| square.contains(p))
        .map(|(dir, _)| dir)
        .or_else(|| bounds.contains(p).then_some(DragDirection::Move))
}
