//! Input model: keys, buttons, modifiers, place modes, cursors and the
//! engine's gesture state.
//!
//! These are the types the host feeds into [`crate::engine::Engine`]. Key
//! names follow the browser's `KeyboardEvent.key` values so a web host can
//! pass them through unchanged.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use frames::TokenKind;

use crate::viewport::ScreenPoint;

/// Modifier keys held during a pointer event. Shift turns a primary drag
/// into a pan.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key, holding the key name as reported by the browser
/// (e.g. `"ArrowLeft"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn arrow(&self) -> Option<Arrow> {
        match self.0.as_str() {
            "ArrowLeft" | "Left" => Some(Arrow::Left),
            "ArrowRight" | "Right" => Some(Arrow::Right),
            "ArrowUp" | "Up" => Some(Arrow::Up),
            "ArrowDown" | "Down" => Some(Arrow::Down),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        matches!(self.0.as_str(), "Escape" | "Esc")
    }

    /// `Home` resets the view.
    #[must_use]
    pub fn is_home(&self) -> bool {
        self.0 == "Home"
    }
}

/// Arrow key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

impl Arrow {
    /// One cell in the arrow's direction.
    #[must_use]
    pub fn delta(self, cell_size: f64) -> (f64, f64) {
        match self {
            Self::Left => (-cell_size, 0.0),
            Self::Right => (cell_size, 0.0),
            Self::Up => (0.0, -cell_size),
            Self::Down => (0.0, cell_size),
        }
    }
}

/// Vertical wheel / trackpad scroll, in pixels (positive = down). Horizontal
/// scroll never zooms, so it is not carried.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dy: f64,
}

/// What a host primary click on empty board does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaceMode {
    /// Select and manipulate existing pieces (default).
    #[default]
    Select,
    /// Place a token of this shape and colour.
    Token { kind: TokenKind, colour: String },
    /// Place the image asset with this id.
    Object { obj_id: i64 },
}

/// Pointer cursor requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Grab,
    Move,
    NwResize,
    NResize,
    NeResize,
    EResize,
    SeResize,
    SResize,
    SwResize,
    WResize,
}

impl Cursor {
    /// CSS `cursor` property value.
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Grab => "grab",
            Self::Move => "move",
            Self::NwResize => "nw-resize",
            Self::NResize => "n-resize",
            Self::NeResize => "ne-resize",
            Self::EResize => "e-resize",
            Self::SeResize => "se-resize",
            Self::SResize => "s-resize",
            Self::SwResize => "sw-resize",
            Self::WResize => "w-resize",
        }
    }
}

/// Gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the board.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: ScreenPoint,
    },
    /// The object controller owns the gesture (resize or move drag).
    ObjectDrag,
}
