//! Popup affordances anchored to board entities.
//!
//! [`PopupButton`] is a round icon button placed next to a grid cell. Its hit
//! radius is `POPUP_RADIUS_PX / scale` board units, so the clickable area
//! stays a constant size on screen at any zoom. [`OptionsMenu`] is the
//! drop-down list of player names used to assign a token's controller; its
//! row sizes come from text metrics measured on the first render.
//!
//! Hit tests are strict: a point exactly on the boundary is outside.

#[cfg(test)]
#[path = "popup_test.rs"]
mod popup_test;

use crate::consts::{
    OPTIONS_EXTRA_WIDTH, OPTIONS_FONT, OPTIONS_OFFSET_X, OPTIONS_OFFSET_Y, OPTIONS_PADDING, POPUP_CENTRE_SCALE,
    POPUP_OFFSET_X, POPUP_OFFSET_Y, POPUP_RADIUS_PX,
};
use crate::doc::Bounds;
use crate::render;
use crate::surface::Surface;
use crate::viewport::BoardPoint;

/// Where a popup button sits relative to its anchor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Right,
    Bottom,
    Left,
}

/// A round icon button that yields `action` when clicked while hovered.
#[derive(Debug, Clone)]
pub struct PopupButton<A> {
    anchor: Anchor,
    icon: &'static str,
    action: A,
    cell_size: f64,
    centre: BoardPoint,
    radius: f64,
    hovered: bool,
}

impl<A: Copy> PopupButton<A> {
    /// A button anchored to the cell whose top-left corner is `cell`.
    #[must_use]
    pub fn new(cell: BoardPoint, cell_size: f64, anchor: Anchor, icon: &'static str, action: A) -> Self {
        let mut button = Self {
            anchor,
            icon,
            action,
            cell_size,
            centre: BoardPoint::default(),
            radius: POPUP_RADIUS_PX,
            hovered: false,
        };
        button.set_position(cell);
        button
    }

    /// Re-anchor to the cell whose top-left corner is `cell`.
    pub fn set_position(&mut self, cell: BoardPoint) {
        let size = self.cell_size;
        let (ox, oy) = (POPUP_OFFSET_X, POPUP_OFFSET_Y);
        let (x, y) = match self.anchor {
            Anchor::TopLeft => (cell.x - ox, cell.y - oy),
            Anchor::TopRight => (cell.x + size + ox, cell.y - oy),
            Anchor::BottomLeft => (cell.x - ox, cell.y + size + oy),
            Anchor::BottomRight => (cell.x + size + ox, cell.y + size + oy),
            Anchor::Top => (cell.x + size / 2.0, cell.y - oy * POPUP_CENTRE_SCALE),
            Anchor::Right => (cell.x + size + ox * POPUP_CENTRE_SCALE, cell.y + size / 2.0),
            Anchor::Bottom => (cell.x + size / 2.0, cell.y + size + oy * POPUP_CENTRE_SCALE),
            Anchor::Left => (cell.x - ox * POPUP_CENTRE_SCALE, cell.y + size / 2.0),
        };
        self.centre = BoardPoint::new(x, y);
    }

    /// Keep the on-screen size constant at the given zoom.
    pub fn set_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.radius = POPUP_RADIUS_PX / scale;
        }
    }

    pub fn set_mouse_coord(&mut self, p: BoardPoint) {
        let c = self.centre;
        let r = self.radius;
        self.hovered = p.x > c.x - r && p.x < c.x + r && p.y > c.y - r && p.y < c.y + r;
    }

    /// The button's action if the pointer is over it.
    #[must_use]
    pub fn on_click(&self) -> Option<A> {
        self.hovered.then_some(self.action)
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[must_use]
    pub fn centre(&self) -> BoardPoint {
        self.centre
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        render::draw_popup_button(surface, self.centre, self.radius, self.icon, self.hovered);
    }
}

/// Row sizes, measured once from the menu font.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MenuMetrics {
    line_height: f64,
    line_width: f64,
}

/// Drop-down list of player names positioned beside a token.
#[derive(Debug, Clone)]
pub struct OptionsMenu {
    origin: BoardPoint,
    names: Vec<String>,
    metrics: Option<MenuMetrics>,
    mouse: BoardPoint,
    hovered: Option<usize>,
}

impl OptionsMenu {
    #[must_use]
    pub fn new(cell: BoardPoint, cell_size: f64, names: Vec<String>) -> Self {
        let mut menu =
            Self { origin: BoardPoint::default(), names, metrics: None, mouse: BoardPoint::default(), hovered: None };
        menu.update_position(cell, cell_size);
        menu
    }

    /// Follow the anchor cell (e.g. while its token moves).
    pub fn update_position(&mut self, cell: BoardPoint, cell_size: f64) {
        self.origin = BoardPoint::new(cell.x + cell_size + OPTIONS_OFFSET_X, cell.y + cell_size + OPTIONS_OFFSET_Y);
        self.refresh_hover();
    }

    pub fn set_mouse_coord(&mut self, p: BoardPoint) {
        self.mouse = p;
        self.refresh_hover();
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.metrics.is_some()
    }

    #[must_use]
    pub fn is_hovered(&self) -> bool {
        self.hovered.is_some()
    }

    /// The hovered player name, which becomes the new controller on click.
    #[must_use]
    pub fn on_click(&self) -> Option<String> {
        self.hovered.and_then(|i| self.names.get(i).cloned())
    }

    /// Bounds of row `index`, once measured.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn row_bounds(&self, index: usize) -> Option<Bounds> {
        let m = self.metrics?;
        let pad = OPTIONS_PADDING;
        Some(Bounds::new(
            self.origin.x - pad,
            self.origin.y + index as f64 * (m.line_height + pad) - pad,
            m.line_width + pad + OPTIONS_EXTRA_WIDTH,
            m.line_height + pad,
        ))
    }

    /// Measure on first use, then draw every row.
    pub fn render(&mut self, surface: &mut dyn Surface) {
        if self.metrics.is_none() {
            self.measure(surface);
        }
        let rows: Vec<(Bounds, &str, bool)> = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((self.row_bounds(i)?, name.as_str(), self.hovered == Some(i))))
            .collect();
        render::draw_options_menu(surface, &rows, OPTIONS_PADDING);
    }

    fn measure(&mut self, surface: &mut dyn Surface) {
        surface.set_font(OPTIONS_FONT);
        // Line height approximated by the width of "M", plus a border pixel.
        let line_height = surface.measure_text("M").width + 1.0;
        let widest = self.names.iter().map(|n| surface.measure_text(n).width).fold(0.0, f64::max);
        self.metrics = Some(MenuMetrics { line_height, line_width: widest + OPTIONS_PADDING });
        self.refresh_hover();
    }

    fn refresh_hover(&mut self) {
        let p = self.mouse;
        self.hovered = (0..self.names.len()).find(|&i| {
            self.row_bounds(i)
                .is_some_and(|b| p.x > b.x && p.x < b.right() && p.y > b.y && p.y < b.bottom())
        });
    }
}
