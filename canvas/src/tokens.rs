//! Token controller.
//!
//! Holds the placed tokens and everything the local client layers on top of
//! them: which token is hovered or selected, the popup buttons and options
//! menu shown for a host selection, and the tentative-movement overlay.
//!
//! Tentative movements make arrow-key moves feel immediate. Each press sends
//! a `Movement` with a fresh id and records the delta under
//! `(token_id, movement_id)`; the token is drawn at its confirmed position
//! plus every live delta. When the server echoes that movement id the entry
//! is removed and the delta lands on the confirmed position, so the net
//! displacement is applied exactly once. Entries the server never confirms
//! expire after [`TENTATIVE_TIMEOUT`].

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tokens_test;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};
use std::time::Instant;

use frames::{Message, MessageKind, TokenKind};
use uuid::Uuid;

use crate::comms::Comms;
use crate::consts::{ICON_DELETE, ICON_OPTIONS, ICON_RENAME, TENTATIVE_TIMEOUT};
use crate::doc::{Token, TokenId};
use crate::input::Arrow;
use crate::popup::{Anchor, OptionsMenu, PopupButton};
use crate::registry::Subscription;
use crate::render::{self, Highlight};
use crate::surface::Surface;
use crate::viewport::{BoardPoint, RenderPass, RepaintFlag, Viewport};

/// Render key and depth. Depth 0 paints over the objects layer.
const RENDER_KEY: &str = "TokenManagerRender";
const RENDER_DEPTH: i32 = 0;

/// What a token popup button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenButton {
    Delete,
    Options,
    Rename,
}

/// Something the host must ask the user before an intent is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequest {
    ConfirmDelete(TokenId),
    Rename { token_id: TokenId, current: Option<String> },
}

/// Outcome of a primary click offered to the token layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    /// Nothing here; later layers may handle the click.
    Missed,
    /// Consumed by a popup, the menu, or a token selection.
    Handled,
    /// Consumed, and the host must prompt the user.
    Request(TokenRequest),
}

#[derive(Debug, Clone, Copy)]
struct TentativeMovement {
    dx: f64,
    dy: f64,
    at: Instant,
}

/// Tokens plus hover, selection and tentative movement state.
pub struct TokenManager {
    comms: Rc<Comms>,
    repaint: RepaintFlag,
    cell_size: f64,
    tokens: BTreeMap<TokenId, Token>,
    /// token id -> movement id -> pending delta
    tentative: HashMap<TokenId, HashMap<String, TentativeMovement>>,
    mouse: BoardPoint,
    mouse_cell: BoardPoint,
    hovered: Option<TokenId>,
    selected: Option<TokenId>,
    buttons: Vec<PopupButton<TokenButton>>,
    options: Option<OptionsMenu>,
    subscriptions: Vec<Subscription>,
}

impl TokenManager {
    /// Create a manager and hook it into `comms` and `viewport`. The
    /// registrations live as long as the returned manager.
    pub fn attach(comms: Rc<Comms>, viewport: &Viewport) -> Rc<RefCell<Self>> {
        let manager = Rc::new(RefCell::new(Self {
            comms: Rc::clone(&comms),
            repaint: viewport.repaint().clone(),
            cell_size: viewport.cell_size(),
            tokens: BTreeMap::new(),
            tentative: HashMap::new(),
            mouse: BoardPoint::default(),
            mouse_cell: BoardPoint::default(),
            hovered: None,
            selected: None,
            buttons: Vec::new(),
            options: None,
            subscriptions: Vec::new(),
        }));

        let weak = Rc::downgrade(&manager);
        let mut subscriptions: Vec<Subscription> = [
            (MessageKind::PlaceToken, "TokenLayerAdd"),
            (MessageKind::DeleteToken, "TokenLayerDelete"),
            (MessageKind::Movement, "TokenLayerMove"),
            (MessageKind::SetController, "TokenLayerSetCtrl"),
            (MessageKind::RenameToken, "TokenLayerRename"),
        ]
        .into_iter()
        .map(|(kind, key)| {
            let weak = Weak::clone(&weak);
            comms.add_listener(kind, key, move |message| with_manager(&weak, |m| m.apply(message)))
        })
        .collect();

        subscriptions.push(viewport.add_render_listener(RENDER_KEY, RENDER_DEPTH, move |surface, pass| {
            with_manager(&weak, |m| m.render(surface, pass));
        }));
        manager.borrow_mut().subscriptions = subscriptions;
        manager
    }

    // --- Inbound ---

    /// Fold one authoritative message into the token map.
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::PlaceToken(placement) => {
                if placement.kind == TokenKind::None {
                    tracing::debug!(token_id = %placement.id, "ignoring placement without a shape");
                    return;
                }
                let token = Token::from_placement(placement.clone());
                self.tokens.insert(token.id.clone(), token);
            }
            Message::DeleteToken { token_id } => {
                if self.selected.as_ref() == Some(token_id) {
                    self.clear_selection();
                }
                self.tentative.remove(token_id);
                if self.tokens.remove(token_id).is_none() {
                    tracing::warn!(%token_id, "delete for unknown token");
                }
            }
            Message::Movement(movement) => {
                if let Some(pending) = self.tentative.get_mut(&movement.token_id) {
                    pending.remove(&movement.id);
                }
                match self.tokens.get_mut(&movement.token_id) {
                    Some(token) => {
                        token.pos = token.pos.offset(movement.dx as f64, movement.dy as f64);
                    }
                    None => tracing::warn!(token_id = %movement.token_id, "movement for unknown token"),
                }
            }
            Message::SetController { token_id, new_controller } => match self.tokens.get_mut(token_id) {
                Some(token) => token.controller = Some(new_controller.clone()),
                None => tracing::warn!(%token_id, "controller change for unknown token"),
            },
            Message::RenameToken { token_id, name } => match self.tokens.get_mut(token_id) {
                Some(token) => token.name = Some(name.clone()),
                None => tracing::warn!(%token_id, "rename for unknown token"),
            },
            _ => return,
        }
        self.sync_popups();
        self.refresh_hover();
        self.repaint.request();
    }

    // --- Input ---

    /// Track the pointer. `board` is the raw board position, `cell` its
    /// grid-snapped cell.
    pub fn set_mouse_coord(&mut self, board: BoardPoint, cell: BoardPoint) {
        let popup_before = self.is_pointer_over_popup();
        self.sync_popups();
        for button in &mut self.buttons {
            button.set_mouse_coord(board);
        }
        if let Some(menu) = &mut self.options {
            menu.set_mouse_coord(board);
        }
        let moved_cell = cell != self.mouse_cell;
        self.mouse = board;
        self.mouse_cell = cell;
        self.refresh_hover();
        if moved_cell || popup_before != self.is_pointer_over_popup() {
            self.repaint.request();
        }
    }

    /// Keep popup hit radii a constant screen size.
    pub fn set_scale(&mut self, scale: f64) {
        for button in &mut self.buttons {
            button.set_scale(scale);
        }
    }

    /// Offer a primary click: the options menu first, then popup buttons,
    /// then token selection at the pointer's cell.
    pub fn on_click(&mut self) -> Click {
        if let Some(menu) = self.options.take() {
            self.repaint.request();
            if let Some(name) = menu.on_click() {
                if let Some(token_id) = &self.selected {
                    self.comms.set_controller(token_id, &name);
                }
                return Click::Handled;
            }
        }

        let pressed = self.buttons.iter().find_map(PopupButton::on_click);
        if let Some(button) = pressed {
            return self.press(button);
        }

        let previous = self.selected.take();
        self.selected = self.token_at(self.mouse_cell);
        if self.selected != previous {
            self.on_select();
            self.repaint.request();
        }
        if self.selected.is_some() { Click::Handled } else { Click::Missed }
    }

    fn press(&mut self, button: TokenButton) -> Click {
        let Some(token_id) = self.selected.clone() else {
            return Click::Missed;
        };
        match button {
            TokenButton::Delete => Click::Request(TokenRequest::ConfirmDelete(token_id)),
            TokenButton::Rename => {
                let current = self.tokens.get(&token_id).and_then(|t| t.name.clone());
                Click::Request(TokenRequest::Rename { token_id, current })
            }
            TokenButton::Options => {
                let cell = self.displayed_position(&token_id).unwrap_or_default();
                let mut menu = OptionsMenu::new(cell, self.cell_size, self.comms.player_names());
                menu.set_mouse_coord(self.mouse);
                self.options = Some(menu);
                self.repaint.request();
                Click::Handled
            }
        }
    }

    /// Rebuild the popup buttons for the current selection. Only the host
    /// gets manipulation affordances.
    fn on_select(&mut self) {
        self.options = None;
        self.buttons.clear();
        if !self.comms.is_host() {
            return;
        }
        let Some(cell) = self.selected.as_ref().and_then(|id| self.displayed_position(id)) else {
            return;
        };
        let size = self.cell_size;
        self.buttons = vec![
            PopupButton::new(cell, size, Anchor::BottomLeft, ICON_DELETE, TokenButton::Delete),
            PopupButton::new(cell, size, Anchor::BottomRight, ICON_OPTIONS, TokenButton::Options),
            PopupButton::new(cell, size, Anchor::Bottom, ICON_RENAME, TokenButton::Rename),
        ];
    }

    /// Move the selected token one cell, if the local player may move it.
    /// Returns whether a movement was sent.
    pub fn on_arrow_key(&mut self, arrow: Arrow) -> bool {
        self.on_arrow_key_at(arrow, Instant::now())
    }

    fn on_arrow_key_at(&mut self, arrow: Arrow, now: Instant) -> bool {
        let Some(token) = self.selected.as_ref().and_then(|id| self.tokens.get(id)) else {
            return false;
        };
        if !self.comms.is_host() && !token.is_controlled_by(self.comms.username()) {
            return false;
        }
        let token_id = token.id.clone();
        let (dx, dy) = arrow.delta(self.cell_size);
        let movement_id = Uuid::new_v4().to_string();
        self.comms.move_token(&movement_id, &token_id, dx, dy);
        tracing::debug!(%token_id, %movement_id, dx, dy, "tentative movement");

        self.tentative.entry(token_id).or_default().insert(movement_id, TentativeMovement { dx, dy, at: now });
        self.sync_popups();
        self.refresh_hover();
        self.repaint.request();
        true
    }

    /// Drop selection, popups and the menu.
    pub fn on_escape(&mut self) {
        if self.selected.is_some() || self.options.is_some() {
            self.repaint.request();
        }
        self.clear_selection();
    }

    /// Place a new token in `cell` (host placement mode). Refuses occupied
    /// cells and shapeless kinds. The token is inserted locally under its
    /// new id; the server echo replaces it in place.
    pub fn place_at(&mut self, cell: BoardPoint, kind: TokenKind, colour: &str) -> Option<TokenId> {
        if kind == TokenKind::None {
            return None;
        }
        if let Some(existing) = self.token_at(cell) {
            tracing::debug!(token_id = %existing, "cell occupied; placement refused");
            return None;
        }
        let id = Uuid::new_v4().to_string();
        self.comms.place_token(&id, kind, cell, colour);
        self.tokens.insert(
            id.clone(),
            Token {
                id: id.clone(),
                name: None,
                kind,
                pos: cell,
                colour: colour.to_owned(),
                controller: None,
            },
        );
        self.refresh_hover();
        self.repaint.request();
        Some(id)
    }

    /// Rename a token locally and tell the server.
    pub fn rename(&mut self, token_id: &str, name: &str) {
        match self.tokens.get_mut(token_id) {
            Some(token) => {
                token.name = Some(name.to_owned());
                self.comms.rename_token(token_id, name);
                self.repaint.request();
            }
            None => tracing::warn!(%token_id, "rename for unknown token"),
        }
    }

    // --- Tentative overlay ---

    /// Drop tentative movements older than the timeout, returning how many
    /// expired. The displayed position reverts to the confirmed one.
    pub fn prune_tentative(&mut self, now: Instant) -> usize {
        let before = self.tentative_total();
        for pending in self.tentative.values_mut() {
            pending.retain(|_, m| now.saturating_duration_since(m.at) <= TENTATIVE_TIMEOUT);
        }
        self.tentative.retain(|_, pending| !pending.is_empty());
        let expired = before - self.tentative_total();
        if expired > 0 {
            tracing::debug!(expired, "tentative movements timed out");
            self.sync_popups();
            self.refresh_hover();
        }
        expired
    }

    /// Whether any movement is still awaiting confirmation.
    #[must_use]
    pub fn has_tentative(&self) -> bool {
        !self.tentative.is_empty()
    }

    fn tentative_total(&self) -> usize {
        self.tentative.values().map(HashMap::len).sum()
    }

    /// Unconfirmed movements pending for `token_id`.
    #[must_use]
    pub fn tentative_count(&self, token_id: &str) -> usize {
        self.tentative.get(token_id).map_or(0, HashMap::len)
    }

    /// Where a token is drawn: its confirmed position plus every live
    /// tentative delta.
    #[must_use]
    pub fn displayed_position(&self, token_id: &str) -> Option<BoardPoint> {
        let token = self.tokens.get(token_id)?;
        let pos = self
            .tentative
            .get(token_id)
            .into_iter()
            .flat_map(HashMap::values)
            .fold(token.pos, |p, m| p.offset(m.dx, m.dy));
        Some(pos)
    }

    fn token_at(&self, cell: BoardPoint) -> Option<TokenId> {
        self.tokens.keys().find(|id| self.displayed_position(id) == Some(cell)).cloned()
    }

    fn refresh_hover(&mut self) {
        self.hovered = self.token_at(self.mouse_cell);
    }

    /// Keep popups anchored to where the selected token is drawn.
    fn sync_popups(&mut self) {
        let Some(cell) = self.selected.as_ref().and_then(|id| self.displayed_position(id)) else {
            return;
        };
        for button in &mut self.buttons {
            button.set_position(cell);
        }
        if let Some(menu) = &mut self.options {
            menu.update_position(cell, self.cell_size);
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.buttons.clear();
        self.options = None;
    }

    // --- Rendering ---

    fn render(&mut self, surface: &mut dyn Surface, pass: &RenderPass) {
        if self.prune_tentative(Instant::now()) == 0 {
            self.refresh_hover();
        }
        let cell = pass.cell_size;
        let username = self.comms.username().to_owned();

        for token in self.tokens.values() {
            let pos = self.displayed_position(&token.id).unwrap_or(token.pos);
            let highlight = if self.selected.as_ref() == Some(&token.id) {
                Highlight::Select
            } else if self.hovered.as_ref() == Some(&token.id) {
                Highlight::Hover
            } else {
                Highlight::None
            };
            if token.is_controlled_by(&username) {
                render::draw_control_glow(surface, pos, cell);
            }
            if let Some(name) = token.display_name() {
                render::draw_name_plate(surface, name, pos, cell);
            }
            render::draw_token(surface, token.kind, pos, cell, &token.colour, highlight);
        }

        self.sync_popups();
        for button in &mut self.buttons {
            button.set_scale(pass.scale);
            button.render(surface);
        }
        if let Some(menu) = &mut self.options {
            menu.render(surface);
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn token(&self, token_id: &str) -> Option<&Token> {
        self.tokens.get(token_id)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Popup buttons currently shown, in creation order.
    #[must_use]
    pub fn buttons(&self) -> &[PopupButton<TokenButton>] {
        &self.buttons
    }

    #[must_use]
    pub fn options_open(&self) -> bool {
        self.options.is_some()
    }

    /// Whether the pointer is over a popup button or menu row.
    #[must_use]
    pub fn is_pointer_over_popup(&self) -> bool {
        self.buttons.iter().any(PopupButton::is_hovered) || self.options.as_ref().is_some_and(OptionsMenu::is_hovered)
    }

    /// Listener keys this manager holds.
    #[must_use]
    pub fn subscription_keys(&self) -> Vec<&str> {
        self.subscriptions.iter().map(Subscription::key).collect()
    }
}

fn with_manager(weak: &Weak<RefCell<TokenManager>>, f: impl FnOnce(&mut TokenManager)) {
    let Some(manager) = weak.upgrade() else {
        return;
    };
    match manager.try_borrow_mut() {
        Ok(mut manager) => f(&mut manager),
        Err(_) => tracing::warn!("token manager busy; event skipped"),
    }
}
