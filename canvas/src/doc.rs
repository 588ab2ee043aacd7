//! Board model: tokens and placed objects.
//!
//! Tokens are grid-locked vector pieces; placed objects are free-floating,
//! resizable bitmaps. Both arrive from the wire with integer coordinates and
//! are held here in `f64` board units so drags and zoom math stay exact until
//! a pose is committed back to the wire.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use frames::{ObjMove, ObjPlacement, TokenKind, TokenPlacement};

use crate::viewport::BoardPoint;

/// Unique identifier for a token (client-minted UUID v4 string).
pub type TokenId = String;

/// Placement identifier of an object, assigned by the server.
pub type PlacementId = String;

/// Axis-aligned rectangle in board units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive containment on all four edges.
    #[must_use]
    pub fn contains(&self, p: BoardPoint) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// A vector-shape game piece occupying one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: TokenId,
    pub name: Option<String>,
    pub kind: TokenKind,
    /// Top-left corner of the token's cell (last confirmed position).
    pub pos: BoardPoint,
    pub colour: String,
    pub controller: Option<String>,
}

impl Token {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_placement(p: TokenPlacement) -> Self {
        Self {
            id: p.id,
            name: p.name,
            kind: p.kind,
            pos: BoardPoint::new(p.x as f64, p.y as f64),
            colour: p.colour,
            controller: p.controller,
        }
    }

    /// Whether `player` may move this token besides the host.
    #[must_use]
    pub fn is_controlled_by(&self, player: &str) -> bool {
        self.controller.as_deref() == Some(player)
    }

    /// Display name, if set and non-empty.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// An image asset placed on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObj {
    pub id: PlacementId,
    /// Id of the image asset.
    pub obj_id: i64,
    pub bounds: Bounds,
    pub controller: Option<String>,
}

impl PlacedObj {
    /// Build from a server placement. Placements without an id are requests
    /// that were never acknowledged, so they yield `None`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_placement(p: ObjPlacement) -> Option<Self> {
        Some(Self {
            id: p.id?,
            obj_id: p.obj_id,
            bounds: Bounds::new(p.x as f64, p.y as f64, p.width as f64, p.height as f64),
            controller: p.controller,
        })
    }

    /// Overwrite the pose from a committed move.
    #[allow(clippy::cast_precision_loss)]
    pub fn apply_move(&mut self, m: &ObjMove) {
        self.bounds = Bounds::new(m.x as f64, m.y as f64, m.w as f64, m.h as f64);
    }

    /// The current pose as a wire update, rounded to whole board units.
    #[must_use]
    pub fn to_move(&self) -> ObjMove {
        let b = self.bounds;
        ObjMove { obj_id: self.id.clone(), x: round(b.x), y: round(b.y), w: round(b.w), h: round(b.h) }
    }
}

/// Round to the nearest whole board unit for the wire.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round(v: f64) -> i64 {
    v.round() as i64
}
