//! Top-level engine.
//!
//! [`Engine`] owns one session's [`Comms`], the [`Viewport`] and both
//! interaction controllers. The host feeds it transport text and input
//! events; every handler returns the [`Action`]s the host must carry out
//! (prompts, cursor changes, connection notices, repaints). Outbound frames
//! accumulate in the `Comms` outbox and are drained by the host after each
//! call.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use crate::assets::{AssetScope, Image};
use crate::comms::{Comms, Identity, Notice};
use crate::doc::{PlacementId, TokenId};
use crate::input::{Button, Cursor, InputState, Key, Modifiers, PlaceMode, WheelDelta};
use crate::objects::{ObjManager, Press};
use crate::surface::Surface;
use crate::tokens::{Click, TokenManager, TokenRequest};
use crate::viewport::{ScreenPoint, Viewport};

/// What a confirmed delete removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Token(TokenId),
    Object(PlacementId),
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetCursor(Cursor),
    /// Ask the user to confirm, then call [`Engine::confirm_delete`].
    ConfirmDelete(DeleteTarget),
    /// Prompt for a new name, then call [`Engine::rename_token`].
    RenameRequested { token_id: TokenId, current: Option<String> },
    ConnectionFailed { reason: String },
    ConnectionLost,
    RenderNeeded,
}

impl From<Notice> for Action {
    fn from(notice: Notice) -> Self {
        match notice {
            Notice::ConnectionFailed { reason } => Self::ConnectionFailed { reason },
            Notice::ConnectionLost => Self::ConnectionLost,
        }
    }
}

/// One session's board: channel, viewport and controllers.
pub struct Engine {
    comms: Rc<Comms>,
    viewport: Viewport,
    tokens: Rc<RefCell<TokenManager>>,
    objects: Rc<RefCell<ObjManager>>,
    input: InputState,
    mode: PlaceMode,
    cursor: Cursor,
    mouse: ScreenPoint,
}

impl Engine {
    /// Build the engine for `identity`. Controllers register with the
    /// session channel and the viewport here and unregister on drop.
    #[must_use]
    pub fn new(identity: Identity, viewport: Viewport) -> Self {
        let comms = Rc::new(Comms::new(identity));
        let tokens = TokenManager::attach(Rc::clone(&comms), &viewport);
        let objects = ObjManager::attach(Rc::clone(&comms), &viewport);
        Self {
            comms,
            viewport,
            tokens,
            objects,
            input: InputState::Idle,
            mode: PlaceMode::Select,
            cursor: Cursor::Default,
            mouse: ScreenPoint::default(),
        }
    }

    // --- Transport ---

    pub fn on_open(&mut self) {
        self.comms.on_open();
    }

    /// Handle one inbound text frame.
    pub fn on_text(&mut self, text: &str) -> Vec<Action> {
        let actions = self.comms.receive(text).map(Action::from).into_iter().collect();
        self.finish(actions)
    }

    pub fn on_close(&mut self) -> Vec<Action> {
        self.comms.on_close().map(Action::from).into_iter().collect()
    }

    /// Frames queued for the transport, in send order.
    pub fn drain_outbox(&mut self) -> Vec<String> {
        self.comms.drain_outbox()
    }

    // --- Assets ---

    /// The asset listing the cache is waiting for, if not yet picked up.
    pub fn take_asset_request(&mut self) -> Option<AssetScope> {
        self.comms.take_asset_request()
    }

    pub fn assets_loaded(&mut self, images: Vec<Image>) -> Vec<Action> {
        tracing::debug!(count = images.len(), "assets loaded");
        self.comms.assets_loaded(images);
        self.viewport.repaint().request();
        self.finish(Vec::new())
    }

    pub fn assets_failed(&mut self) {
        self.comms.assets_failed();
    }

    // --- Mode / viewport ---

    pub fn set_mode(&mut self, mode: PlaceMode) {
        tracing::debug!(?mode, "place mode");
        self.mode = mode;
    }

    /// Update the canvas size in CSS pixels.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport.resize(width, height);
        self.finish(Vec::new())
    }

    // --- Input events ---

    /// Primary presses go to tokens, then host placement, then objects; a
    /// press nothing claims pans. Middle and secondary presses, and primary
    /// presses with Shift held, always pan.
    pub fn on_pointer_down(&mut self, screen: ScreenPoint, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.mouse = screen;
        self.sync_pointer();

        let mut actions = Vec::new();
        if button != Button::Primary || modifiers.shift {
            self.start_pan(screen);
            return self.finish(actions);
        }

        let click = self.tokens.borrow_mut().on_click();
        match click {
            Click::Handled => return self.finish(actions),
            Click::Request(TokenRequest::ConfirmDelete(token_id)) => {
                actions.push(Action::ConfirmDelete(DeleteTarget::Token(token_id)));
                return self.finish(actions);
            }
            Click::Request(TokenRequest::Rename { token_id, current }) => {
                actions.push(Action::RenameRequested { token_id, current });
                return self.finish(actions);
            }
            Click::Missed => {}
        }

        if self.comms.is_host() && self.place_at_pointer() {
            return self.finish(actions);
        }

        let press = self.objects.borrow_mut().on_pointer_down();
        match press {
            Press::Dragging(dir) => {
                tracing::debug!(?dir, "object drag");
                self.input = InputState::ObjectDrag;
            }
            Press::ConfirmDelete(id) => actions.push(Action::ConfirmDelete(DeleteTarget::Object(id))),
            Press::Missed => self.start_pan(screen),
        }
        self.finish(actions)
    }

    pub fn on_pointer_move(&mut self, screen: ScreenPoint) -> Vec<Action> {
        if let InputState::Panning { last_screen } = self.input {
            self.viewport.pan_by(screen.delta_from(last_screen));
            self.input = InputState::Panning { last_screen: screen };
        }
        self.mouse = screen;
        self.sync_pointer();
        self.finish(Vec::new())
    }

    pub fn on_pointer_up(&mut self, screen: ScreenPoint) -> Vec<Action> {
        self.mouse = screen;
        self.sync_pointer();
        if self.input == InputState::ObjectDrag {
            self.objects.borrow_mut().on_pointer_up();
        }
        if self.input != InputState::Idle {
            self.input = InputState::Idle;
            self.viewport.repaint().request();
        }
        self.finish(Vec::new())
    }

    /// Scrolling up zooms in one step around the cursor.
    pub fn on_wheel(&mut self, screen: ScreenPoint, delta: WheelDelta) -> Vec<Action> {
        if delta.dy == 0.0 {
            return Vec::new();
        }
        let steps = if delta.dy < 0.0 { 1.0 } else { -1.0 };
        self.viewport.zoom_at(screen, steps);
        self.mouse = screen;
        self.sync_scale();
        self.finish(Vec::new())
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() {
            self.tokens.borrow_mut().on_escape();
            self.objects.borrow_mut().on_escape();
            if self.input == InputState::ObjectDrag {
                self.input = InputState::Idle;
            }
        } else if key.is_home() {
            self.viewport.reset_view();
            self.sync_scale();
        } else if let Some(arrow) = key.arrow() {
            self.tokens.borrow_mut().on_arrow_key(arrow);
        }
        self.finish(Vec::new())
    }

    // --- Prompt answers ---

    /// The user confirmed a delete requested by [`Action::ConfirmDelete`].
    /// The piece disappears when the server echoes the delete.
    pub fn confirm_delete(&mut self, target: &DeleteTarget) {
        match target {
            DeleteTarget::Token(token_id) => self.comms.delete_token(token_id),
            DeleteTarget::Object(id) => self.comms.delete_obj(id),
        }
    }

    pub fn rename_token(&mut self, token_id: &str, name: &str) -> Vec<Action> {
        self.tokens.borrow_mut().rename(token_id, name);
        self.finish(Vec::new())
    }

    // --- Time / render ---

    /// Expire unconfirmed tentative movements.
    pub fn tick(&mut self, now: Instant) -> Vec<Action> {
        if self.tokens.borrow_mut().prune_tentative(now) > 0 {
            self.viewport.repaint().request();
        }
        self.finish(Vec::new())
    }

    /// Whether state changed since the last render.
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.viewport.repaint().is_requested()
    }

    /// Draw the board, then report a cursor change if the picture implies one.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Vec<Action> {
        self.viewport.render(surface);
        let cursor = self.desired_cursor();
        if cursor == self.cursor {
            return Vec::new();
        }
        self.cursor = cursor;
        vec![Action::SetCursor(cursor)]
    }

    // --- Internals ---

    fn start_pan(&mut self, screen: ScreenPoint) {
        self.input = InputState::Panning { last_screen: screen };
        self.viewport.repaint().request();
    }

    /// Place in the current mode at the pointer's cell. Returns whether the
    /// press was consumed by a placement mode.
    fn place_at_pointer(&mut self) -> bool {
        let cell = self.viewport.snap_to_grid(self.viewport.transform(self.mouse));
        match self.mode.clone() {
            PlaceMode::Select => false,
            PlaceMode::Token { kind, colour } => {
                if let Some(id) = self.tokens.borrow_mut().place_at(cell, kind, &colour) {
                    tracing::info!(token_id = %id, x = cell.x, y = cell.y, "token placed");
                }
                true
            }
            PlaceMode::Object { obj_id } => {
                if self.objects.borrow_mut().place_at(cell, obj_id) {
                    tracing::info!(obj_id, x = cell.x, y = cell.y, "object placement sent");
                }
                true
            }
        }
    }

    fn sync_pointer(&mut self) {
        let board = self.viewport.transform(self.mouse);
        let cell = self.viewport.snap_to_grid(board);
        self.tokens.borrow_mut().set_mouse_coord(board, cell);
        self.objects.borrow_mut().set_mouse_coord(board, self.viewport.scale());
    }

    fn sync_scale(&mut self) {
        self.tokens.borrow_mut().set_scale(self.viewport.scale());
        self.sync_pointer();
    }

    fn desired_cursor(&self) -> Cursor {
        if matches!(self.input, InputState::Panning { .. }) {
            return Cursor::Grab;
        }
        let tokens = self.tokens.borrow();
        let objects = self.objects.borrow();
        if tokens.is_pointer_over_popup() || objects.is_pointer_over_popup() {
            Cursor::Pointer
        } else if let Some(dir) = objects.handle_under_pointer() {
            dir.cursor()
        } else {
            Cursor::Default
        }
    }

    fn finish(&self, mut actions: Vec<Action>) -> Vec<Action> {
        if self.needs_render() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn comms(&self) -> &Comms {
        &self.comms
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn tokens(&self) -> Ref<'_, TokenManager> {
        self.tokens.borrow()
    }

    #[must_use]
    pub fn objects(&self) -> Ref<'_, ObjManager> {
        self.objects.borrow()
    }

    #[must_use]
    pub fn mode(&self) -> &PlaceMode {
        &self.mode
    }

    #[must_use]
    pub fn input(&self) -> InputState {
        self.input
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}
