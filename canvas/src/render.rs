//! Drawing routines for tokens, objects and popup affordances.
//!
//! This module is the only place that decides what the board looks like.
//! Every function draws in board space onto a [`Surface`] whose transform the
//! viewport has already set, reads only the values it is given, and mutates
//! no application state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use frames::TokenKind;

use crate::assets::Image;
use crate::consts::{NAME_FONT, NAME_PLATE_PADDING, OPTIONS_FONT, TOKEN_PADDING_RATIO};
use crate::doc::Bounds;
use crate::hit;
use crate::surface::{Glow, Surface, TextAlign};
use crate::viewport::BoardPoint;

const TOKEN_OUTLINE: &str = "black";
const TOKEN_HOVER_OUTLINE: &str = "#bbbbbb";
const TOKEN_SELECT_OUTLINE: &str = "white";

const NAME_PLATE_FILL: &str = "#00000099";
const NAME_FILL: &str = "#ffffffff";
const NAME_STROKE: &str = "#000000";

const ICON_BACKGROUND: &str = "#444444";
const ICON_IDLE: &str = "#999999";
const ICON_HOVERED: &str = "#ffffff";
/// Vertical nudge of the icon disc behind the glyph.
const ICON_BACKGROUND_OFFSET_Y: f64 = 2.0;

const MENU_BORDER: &str = "#0f111a";
const MENU_ROW: &str = "#2D3354";
const MENU_ROW_HOVERED: &str = "#444C7B";
const MENU_TEXT: &str = "#e2cca4";

const OBJECT_HOVER_OUTLINE: &str = "#dddddd";
const OBJECT_SELECT_OUTLINE: &str = "white";
const OBJECT_PLACEHOLDER: &str = "#ffffff33";

/// Outline emphasis of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    Hover,
    Select,
}

// =============================================================
// Tokens
// =============================================================

/// Draw a token shape inset within the cell at `pos`.
pub fn draw_token(
    surface: &mut dyn Surface,
    kind: TokenKind,
    pos: BoardPoint,
    cell: f64,
    colour: &str,
    highlight: Highlight,
) {
    if kind == TokenKind::None {
        return;
    }
    let pad = cell * TOKEN_PADDING_RATIO;
    let radius = (cell - 2.0 * pad) / 2.0;
    let (x, y) = (pos.x, pos.y);

    surface.set_line_width(2.0);
    surface.set_stroke_style(match highlight {
        Highlight::None => TOKEN_OUTLINE,
        Highlight::Hover => TOKEN_HOVER_OUTLINE,
        Highlight::Select => TOKEN_SELECT_OUTLINE,
    });
    surface.set_fill_style(colour);

    surface.begin_path();
    match kind {
        TokenKind::None | TokenKind::Circle => {
            surface.arc(x + cell / 2.0, y + cell / 2.0, radius, 0.0, 2.0 * PI);
        }
        TokenKind::Square => {
            surface.move_to(x + pad, y + pad);
            surface.line_to(x + cell - pad, y + pad);
            surface.line_to(x + cell - pad, y + cell - pad);
            surface.line_to(x + pad, y + cell - pad);
        }
        TokenKind::Triangle => {
            surface.move_to(x + cell / 2.0, y + pad);
            surface.line_to(x + cell - pad, y + cell - pad);
            surface.line_to(x + pad, y + cell - pad);
        }
        TokenKind::Diamond => {
            surface.move_to(x + pad, y + cell / 2.0);
            surface.line_to(x + cell / 2.0, y + pad);
            surface.line_to(x + cell - pad, y + cell / 2.0);
            surface.line_to(x + cell / 2.0, y + cell - pad);
        }
    }
    surface.close_path();
    surface.fill();
    surface.stroke();
}

/// Name centred above the cell on a translucent plate.
pub fn draw_name_plate(surface: &mut dyn Surface, name: &str, pos: BoardPoint, cell: f64) {
    surface.set_font(NAME_FONT);
    surface.set_text_align(TextAlign::Center);
    let m = surface.measure_text(name);

    let pad = NAME_PLATE_PADDING;
    let name_x = pos.x + cell / 2.0;
    let name_y = pos.y - 2.0;

    surface.set_fill_style(NAME_PLATE_FILL);
    surface.fill_rect(
        name_x - m.left - pad,
        name_y - m.ascent - pad,
        m.left + m.right + 2.0 * pad,
        m.ascent + m.descent + 2.0 * pad,
    );

    surface.set_fill_style(NAME_FILL);
    surface.set_stroke_style(NAME_STROKE);
    surface.set_line_width(1.0);
    surface.fill_text(name, name_x, name_y);
    surface.stroke_text(name, name_x, name_y);
}

/// Soft glow under a token the local player controls.
pub fn draw_control_glow(surface: &mut dyn Surface, pos: BoardPoint, cell: f64) {
    surface.fill_glow(&Glow {
        cx: pos.x + cell / 2.0,
        cy: pos.y + cell / 2.0,
        r0: (cell * 0.3).round(),
        r1: (cell * 0.5).round(),
        inner: "white".to_owned(),
        outer: "#00000000".to_owned(),
        x: pos.x - cell,
        y: pos.y - cell,
        w: 3.0 * cell,
        h: 3.0 * cell,
    });
}

// =============================================================
// Objects
// =============================================================

/// Draw a placed object's image, or a faint placeholder while it loads.
pub fn draw_object(surface: &mut dyn Surface, image: Option<&Image>, b: &Bounds) {
    match image {
        Some(image) => surface.draw_image(image, b.x, b.y, b.w, b.h),
        None => {
            surface.set_fill_style(OBJECT_PLACEHOLDER);
            surface.fill_rect(b.x, b.y, b.w, b.h);
        }
    }
}

/// Outline a hovered or selected object; selected objects also get their
/// eight control squares.
pub fn draw_object_outline(surface: &mut dyn Surface, b: &Bounds, selected: bool, scale: f64) {
    surface.set_line_width(2.0);
    surface.set_stroke_style(if selected { OBJECT_SELECT_OUTLINE } else { OBJECT_HOVER_OUTLINE });
    surface.stroke_rect(b.x, b.y, b.w, b.h);

    if !selected {
        return;
    }
    surface.set_fill_style("white");
    surface.set_stroke_style("black");
    surface.set_line_width(1.0 / scale.min(1.0));
    for (_, square) in hit::control_squares(b, scale) {
        surface.begin_path();
        surface.rect(square.x, square.y, square.w, square.h);
        surface.fill();
        surface.stroke();
    }
}

// =============================================================
// Popups
// =============================================================

/// Round icon button: a dark disc with a glyph, brighter when hovered.
pub fn draw_popup_button(surface: &mut dyn Surface, centre: BoardPoint, radius: f64, icon: &str, hovered: bool) {
    surface.set_fill_style(ICON_BACKGROUND);
    surface.begin_path();
    surface.arc(centre.x, centre.y + ICON_BACKGROUND_OFFSET_Y, radius * 1.1, 0.0, 2.0 * PI);
    surface.close_path();
    surface.fill();

    surface.set_fill_style(if hovered { ICON_HOVERED } else { ICON_IDLE });
    surface.set_font(&format!("{:.0}px FontAwesome", 1.8 * radius));
    surface.set_text_align(TextAlign::Center);
    surface.fill_text(icon, centre.x, centre.y + radius * 0.8);
}

/// Options menu rows: `(bounds, label, hovered)`.
pub fn draw_options_menu(surface: &mut dyn Surface, rows: &[(Bounds, &str, bool)], padding: f64) {
    surface.set_line_width(1.0);
    surface.set_stroke_style(MENU_BORDER);
    for (b, label, hovered) in rows {
        surface.set_fill_style(if *hovered { MENU_ROW_HOVERED } else { MENU_ROW });
        surface.fill_rect(b.x, b.y, b.w, b.h);
        surface.stroke_rect(b.x, b.y, b.w, b.h);

        surface.set_text_align(TextAlign::Left);
        surface.set_font(OPTIONS_FONT);
        surface.set_fill_style(MENU_TEXT);
        surface.fill_text(label, b.x + padding, b.bottom() - padding / 2.0);
    }
}
