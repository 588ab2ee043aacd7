//! Viewport: the single authoritative pan/zoom transform.
//!
//! The board is drawn as `screen = board * scale + translation`. Controllers
//! never cache `scale` or `translation`; they receive `&Viewport` when they
//! need to convert coordinates and a [`RenderPass`] while drawing.
//!
//! Repainting is demand driven. Every mutation that changes the picture
//! raises the shared [`RepaintFlag`]; the host renders when it sees the flag
//! and `render` lowers it again.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::cell::{Cell, RefCell};
use std::ops::RangeInclusive;
use std::rc::Rc;

use crate::consts::{DEFAULT_CELL_SIZE, DEFAULT_ZOOM_STEP, GRID_COLOUR, MAX_SCALE, MIN_SCALE};
use crate::registry::{Registry, Subscription};
use crate::surface::Surface;

/// A position in CSS pixels relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: ScreenPoint) -> ScreenDelta {
        ScreenDelta::new(self.x - origin.x, self.y - origin.y)
    }
}

/// A position in board units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoardPoint {
    pub x: f64,
    pub y: f64,
}

impl BoardPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// A displacement in CSS pixels, used for panning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenDelta {
    pub dx: f64,
    pub dy: f64,
}

impl ScreenDelta {
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Per-frame values handed to every render listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPass {
    pub cell_size: f64,
    pub scale: f64,
    pub translation: ScreenPoint,
}

/// Render listener signature. Drawing happens in board space.
pub type RenderCallback = dyn FnMut(&mut dyn Surface, &RenderPass);

/// Shared "picture is stale" flag.
///
/// Cloning shares the flag; controllers hold a clone and raise it from their
/// message listeners.
#[derive(Debug, Clone, Default)]
pub struct RepaintFlag(Rc<Cell<bool>>);

impl RepaintFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    /// Lower the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

/// Grid line indices covering the visible area, in cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSpan {
    pub cols: RangeInclusive<i64>,
    pub rows: RangeInclusive<i64>,
}

/// Canvas size, transform, grid and the render-listener registry.
pub struct Viewport {
    width: f64,
    height: f64,
    translation: ScreenPoint,
    scale: f64,
    cell_size: f64,
    zoom_step: f64,
    listeners: Registry<RenderCallback>,
    repaint: RepaintFlag,
}

impl Viewport {
    /// Create a viewport with the identity transform.
    ///
    /// Non-positive `cell_size` or `zoom_step` fall back to the defaults.
    #[must_use]
    pub fn new(width: f64, height: f64, cell_size: f64, zoom_step: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { DEFAULT_CELL_SIZE };
        let zoom_step = if zoom_step > 0.0 { zoom_step } else { DEFAULT_ZOOM_STEP };
        let repaint = RepaintFlag::new();
        repaint.request();
        Self {
            width,
            height,
            translation: ScreenPoint::default(),
            scale: 1.0,
            cell_size,
            zoom_step,
            listeners: Registry::new(),
            repaint,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn translation(&self) -> ScreenPoint {
        self.translation
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[must_use]
    pub fn zoom_step(&self) -> f64 {
        self.zoom_step
    }

    /// The repaint flag shared with controllers.
    #[must_use]
    pub fn repaint(&self) -> &RepaintFlag {
        &self.repaint
    }

    /// Keys of the registered render listeners, in paint order.
    #[must_use]
    pub fn listener_keys(&self) -> Vec<String> {
        self.listeners.keys()
    }

    // --- Coordinates ---

    /// Screen to board: `(screen - translation) / scale`.
    #[must_use]
    pub fn transform(&self, p: ScreenPoint) -> BoardPoint {
        BoardPoint::new((p.x - self.translation.x) / self.scale, (p.y - self.translation.y) / self.scale)
    }

    /// Board to screen: `board * scale + translation`.
    #[must_use]
    pub fn to_screen(&self, p: BoardPoint) -> ScreenPoint {
        ScreenPoint::new(p.x * self.scale + self.translation.x, p.y * self.scale + self.translation.y)
    }

    /// Floor each axis to the cell boundary at or below it.
    #[must_use]
    pub fn snap_to_grid(&self, p: BoardPoint) -> BoardPoint {
        BoardPoint::new(
            (p.x / self.cell_size).floor() * self.cell_size,
            (p.y / self.cell_size).floor() * self.cell_size,
        )
    }

    // --- Transform mutation ---

    /// Multiply the scale by `exp(steps * zoom_step)`, keeping the board point
    /// under `cursor` fixed on screen. Positive `steps` zoom in.
    ///
    /// The scale stays within [`MIN_SCALE`]`..=`[`MAX_SCALE`]; a notch past
    /// either end changes nothing.
    pub fn zoom_at(&mut self, cursor: ScreenPoint, steps: f64) {
        let next = (self.scale * (steps * self.zoom_step).exp()).clamp(MIN_SCALE, MAX_SCALE);
        if !next.is_finite() || next == self.scale {
            return;
        }
        let ratio = next / self.scale;
        self.translation = ScreenPoint::new(
            cursor.x - (cursor.x - self.translation.x) * ratio,
            cursor.y - (cursor.y - self.translation.y) * ratio,
        );
        self.scale = next;
        self.repaint.request();
    }

    /// Add a raw screen-space drag delta to the translation.
    pub fn pan_by(&mut self, delta: ScreenDelta) {
        self.translation.x += delta.dx;
        self.translation.y += delta.dy;
        self.repaint.request();
    }

    /// Back to `scale = 1`, `translation = (0, 0)`.
    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.translation = ScreenPoint::default();
        self.repaint.request();
    }

    /// Update the canvas size in CSS pixels.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.repaint.request();
    }

    // --- Rendering ---

    /// Register a render listener under `key`, replacing any previous one.
    ///
    /// Listeners paint in descending `depth` order, so depth 0 paints over depth 1.
    pub fn add_render_listener<F>(&self, key: &str, depth: i32, callback: F) -> Subscription
    where
        F: FnMut(&mut dyn Surface, &RenderPass) + 'static,
    {
        let callback: Rc<RefCell<RenderCallback>> = Rc::new(RefCell::new(callback));
        self.listeners.register(key, depth, callback)
    }

    /// Cells whose grid lines cover the visible area.
    ///
    /// The span extends `ceil(|translation / scale / cell|)` cells past each
    /// edge so the grid looks infinite at any pan offset.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn grid_span(&self) -> GridSpan {
        let unit = self.scale * self.cell_size;
        let over_x = (self.translation.x / unit).abs().ceil() as i64;
        let over_y = (self.translation.y / unit).abs().ceil() as i64;
        let cols = (self.width / unit).ceil() as i64;
        let rows = (self.height / unit).ceil() as i64;
        GridSpan { cols: -over_x..=cols + over_x, rows: -over_y..=rows + over_y }
    }

    /// Clear, apply the transform, draw the grid, then invoke every render
    /// listener in depth order.
    pub fn render(&self, surface: &mut dyn Surface) {
        self.repaint.take();

        surface.set_transform(1.0, 0.0, 0.0);
        surface.clear(self.width, self.height);
        surface.set_transform(self.scale, self.translation.x, self.translation.y);
        self.draw_grid(surface);

        let pass = RenderPass { cell_size: self.cell_size, scale: self.scale, translation: self.translation };
        for callback in self.listeners.snapshot() {
            match callback.try_borrow_mut() {
                Ok(mut cb) => (&mut *cb)(&mut *surface, &pass),
                Err(_) => tracing::warn!("render listener re-entered during render; skipped"),
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_grid(&self, surface: &mut dyn Surface) {
        let span = self.grid_span();
        let cell = self.cell_size;
        let (x0, x1) = (*span.cols.start() as f64 * cell, *span.cols.end() as f64 * cell);
        let (y0, y1) = (*span.rows.start() as f64 * cell, *span.rows.end() as f64 * cell);

        surface.set_stroke_style(GRID_COLOUR);
        surface.set_line_width(1.0 / self.scale.max(1.0));
        surface.begin_path();
        for col in span.cols {
            let x = col as f64 * cell;
            surface.move_to(x, y0);
            surface.line_to(x, y1);
        }
        for row in span.rows {
            let y = row as f64 * cell;
            surface.move_to(x0, y);
            surface.line_to(x1, y);
        }
        surface.stroke();
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, DEFAULT_CELL_SIZE, DEFAULT_ZOOM_STEP)
    }
}
