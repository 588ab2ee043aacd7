//! Shared numeric constants for the canvas crate.

use std::time::Duration;

// ── Viewport ────────────────────────────────────────────────────

/// Default grid cell size in board units.
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Default zoom exponent per wheel notch: `scale *= exp(±step)`.
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;

/// Zoom floor. Below this the grid would need thousands of lines per frame.
pub const MIN_SCALE: f64 = 0.05;

/// Zoom ceiling.
pub const MAX_SCALE: f64 = 20.0;

/// Grid line colour.
pub const GRID_COLOUR: &str = "#2d3354";

// ── Tokens ──────────────────────────────────────────────────────

/// Lifetime of an unconfirmed tentative movement.
pub const TENTATIVE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Inset of a token shape from its cell edge, as a fraction of the cell.
pub const TOKEN_PADDING_RATIO: f64 = 0.15;

/// Font used for token name plates.
pub const NAME_FONT: &str = "bold 18pt sans-serif";

/// Padding around a token name inside its plate.
pub const NAME_PLATE_PADDING: f64 = 8.0;

// ── Objects ─────────────────────────────────────────────────────

/// Smallest width or height an object can be resized to, in board units.
pub const MIN_OBJECT_SIZE: f64 = 16.0;

/// Distance within which a dragged edge snaps onto a grid line.
pub const SNAP_TOLERANCE: f64 = 8.0;

/// Side of a resize control square in screen pixels at zoom <= 1.
pub const CONTROL_SIZE_PX: f64 = 10.0;

/// Offset of the object delete button from the object's top-left corner.
pub const OBJECT_BUTTON_OFFSET_PX: f64 = 20.0;

// ── Popups ──────────────────────────────────────────────────────

/// Popup button hit radius in screen pixels.
pub const POPUP_RADIUS_PX: f64 = 15.0;

/// Horizontal gap between a popup button and its anchor cell.
pub const POPUP_OFFSET_X: f64 = 6.0;

/// Vertical gap between a popup button and its anchor cell.
pub const POPUP_OFFSET_Y: f64 = 8.0;

/// Multiplier applied to the offset for edge-centred anchors.
pub const POPUP_CENTRE_SCALE: f64 = 2.0;

/// Options menu row padding.
pub const OPTIONS_PADDING: f64 = 14.0;

/// Extra horizontal room in each options menu row.
pub const OPTIONS_EXTRA_WIDTH: f64 = 32.0;

/// Options menu offset from the right edge of the anchor cell.
pub const OPTIONS_OFFSET_X: f64 = 30.0;

/// Options menu offset below the anchor cell.
pub const OPTIONS_OFFSET_Y: f64 = 32.0;

/// Font used for options menu rows.
pub const OPTIONS_FONT: &str = "20px sans-serif";

/// Font-awesome glyphs for popup buttons.
pub const ICON_DELETE: &str = "\u{f014}";
pub const ICON_OPTIONS: &str = "\u{f013}";
pub const ICON_RENAME: &str = "\u{f044}";
