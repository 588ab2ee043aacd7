//! Session channel: connection phase, listener dispatch and the outbox.
//!
//! `Comms` is the explicitly owned session object. It performs no I/O itself:
//! the runtime tells it when the transport opens or closes, feeds it every
//! inbound text frame, and drains the frames it queued. That keeps the whole
//! protocol state machine synchronous and testable.
//!
//! ```text
//! Connecting ──on_open──▶ Open ──on_close──▶ Closed
//!      │                    │
//!      └──FailedConnection──┴──────────────▶ Failed (terminal)
//! ```
//!
//! Inbound frames are decoded once, folded into the session state (host flag,
//! host id, roster) and then handed to every listener registered for that
//! message kind. Listener sets use [`Registry`], so one key holds at most one
//! callback.
//!
//! Comms also owns the image [`AssetCache`]; see [`Comms::object_image`].

#[cfg(test)]
#[path = "comms_test.rs"]
mod comms_test;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use frames::{Message, MessageKind, ObjMove, ObjPlacement, TokenKind, TokenPlacement};

use crate::assets::{AssetCache, AssetScope, Image, ImageHandle};
use crate::doc::{Bounds, round};
use crate::registry::{Registry, Subscription};
use crate::viewport::BoardPoint;

/// Message listener signature.
pub type MessageCallback = dyn FnMut(&Message);

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Connecting,
    Open,
    Closed,
    /// The server refused the session. Terminal.
    Failed,
}

/// Who the local client is, supplied by the external login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub username: String,
    /// Session (game) identifier sent during the handshake.
    pub game: String,
}

impl Identity {
    #[must_use]
    pub fn new(token: impl Into<String>, username: impl Into<String>, game: impl Into<String>) -> Self {
        Self { token: token.into(), username: username.into(), game: game.into() }
    }
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPlayer {
    pub name: String,
    pub host: bool,
}

/// Connection condition the host UI should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The server refused the session; show `reason` verbatim.
    ConnectionFailed { reason: String },
    /// The socket closed without an explanation; offer a reload.
    ConnectionLost,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    is_host: bool,
    host_id: Option<i64>,
    should_show_refresh: bool,
    players: Vec<StoredPlayer>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { phase: Phase::Connecting, is_host: false, host_id: None, should_show_refresh: true, players: Vec::new() }
    }
}

impl SessionState {
    fn upsert_player(&mut self, name: &str, host: bool) {
        self.players.retain(|p| p.name != name);
        let player = StoredPlayer { name: name.to_owned(), host };
        if host {
            self.players.insert(0, player);
        } else {
            self.players.push(player);
        }
    }
}

/// One session's channel state.
pub struct Comms {
    identity: Identity,
    state: RefCell<SessionState>,
    listeners: [Registry<MessageCallback>; MessageKind::ALL.len()],
    outbox: RefCell<VecDeque<String>>,
    assets: RefCell<AssetCache>,
}

impl Comms {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            state: RefCell::new(SessionState::default()),
            listeners: std::array::from_fn(|_| Registry::new()),
            outbox: RefCell::new(VecDeque::new()),
            assets: RefCell::new(AssetCache::new()),
        }
    }

    // --- Listeners ---

    /// Register `callback` for messages of `kind` under `key`, replacing any
    /// listener already registered under that key for that kind.
    pub fn add_listener<F>(&self, kind: MessageKind, key: &str, callback: F) -> Subscription
    where
        F: FnMut(&Message) + 'static,
    {
        let callback: Rc<RefCell<MessageCallback>> = Rc::new(RefCell::new(callback));
        self.registry(kind).register(key, 0, callback)
    }

    /// Keys currently registered for `kind`.
    #[must_use]
    pub fn listener_keys(&self, kind: MessageKind) -> Vec<String> {
        self.registry(kind).keys()
    }

    fn registry(&self, kind: MessageKind) -> &Registry<MessageCallback> {
        &self.listeners[kind as usize]
    }

    // --- Transport events ---

    /// The transport connected. Queues the handshake ahead of anything
    /// buffered while connecting.
    pub fn on_open(&self) {
        self.state.borrow_mut().phase = Phase::Open;
        let [token, game] = frames::handshake_frames(&self.identity.token, &self.identity.game);
        let mut outbox = self.outbox.borrow_mut();
        outbox.push_front(game);
        outbox.push_front(token);
        tracing::info!(username = %self.identity.username, game = %self.identity.game, "session open");
    }

    /// Handle one inbound text frame. Malformed frames are logged and dropped.
    pub fn receive(&self, text: &str) -> Option<Notice> {
        let message = match frames::decode(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return None;
            }
        };
        let notice = self.apply(&message);
        self.dispatch(&message);
        notice
    }

    /// The transport closed. Reports a lost connection unless a failure
    /// message already explained it.
    pub fn on_close(&self) -> Option<Notice> {
        let mut state = self.state.borrow_mut();
        if state.phase == Phase::Failed {
            return None;
        }
        state.phase = Phase::Closed;
        tracing::info!(username = %self.identity.username, "session closed");
        if state.should_show_refresh {
            state.should_show_refresh = false;
            Some(Notice::ConnectionLost)
        } else {
            None
        }
    }

    fn apply(&self, message: &Message) -> Option<Notice> {
        let mut state = self.state.borrow_mut();
        match message {
            Message::Connect { username, host, host_id } => {
                if host_id.is_some() {
                    state.host_id = *host_id;
                }
                if *host && *username == self.identity.username {
                    state.is_host = true;
                }
                state.upsert_player(username, *host);
                tracing::info!(%username, host, "player connected");
                None
            }
            Message::Disconnect { username } => {
                state.players.retain(|p| p.name != *username);
                tracing::info!(%username, "player disconnected");
                None
            }
            Message::FailedConnection { reason } => {
                state.should_show_refresh = false;
                state.phase = Phase::Failed;
                tracing::warn!(%reason, "server refused session");
                Some(Notice::ConnectionFailed { reason: reason.clone() })
            }
            _ => None,
        }
    }

    fn dispatch(&self, message: &Message) {
        let kind = message.kind();
        let callbacks = self.registry(kind).snapshot();
        tracing::debug!(kind = kind.tag(), listeners = callbacks.len(), "dispatch");
        for callback in callbacks {
            match callback.try_borrow_mut() {
                Ok(mut cb) => (&mut *cb)(message),
                Err(_) => tracing::warn!(kind = kind.tag(), "message listener re-entered; skipped"),
            }
        }
    }

    // --- Outbound intents ---

    pub fn place_token(&self, id: &str, kind: TokenKind, cell: BoardPoint, colour: &str) {
        self.send(Message::PlaceToken(TokenPlacement {
            id: id.to_owned(),
            name: None,
            kind,
            x: round(cell.x),
            y: round(cell.y),
            colour: colour.to_owned(),
            controller: None,
        }));
    }

    pub fn move_token(&self, id: &str, token_id: &str, dx: f64, dy: f64) {
        self.send(Message::Movement(frames::Movement {
            id: id.to_owned(),
            token_id: token_id.to_owned(),
            dx: round(dx),
            dy: round(dy),
        }));
    }

    pub fn delete_token(&self, token_id: &str) {
        self.send(Message::DeleteToken { token_id: token_id.to_owned() });
    }

    pub fn set_controller(&self, token_id: &str, new_controller: &str) {
        self.send(Message::SetController { token_id: token_id.to_owned(), new_controller: new_controller.to_owned() });
    }

    pub fn rename_token(&self, token_id: &str, name: &str) {
        self.send(Message::RenameToken { token_id: token_id.to_owned(), name: name.to_owned() });
    }

    /// Request a new object placement. Geometry is rounded to whole units.
    pub fn place_obj(&self, obj_id: i64, bounds: &Bounds) {
        self.send(Message::PlaceObj(ObjPlacement {
            id: None,
            obj_id,
            x: round(bounds.x),
            y: round(bounds.y),
            width: round(bounds.w),
            height: round(bounds.h),
            controller: None,
        }));
    }

    pub fn delete_obj(&self, placement_id: &str) {
        self.send(Message::DeleteObj { obj_id: placement_id.to_owned() });
    }

    pub fn move_obj(&self, update: ObjMove) {
        self.send(Message::MoveObj(update));
    }

    /// Queue `message`. Frames sent while connecting wait behind the
    /// handshake; after the session ends they are dropped.
    fn send(&self, message: Message) {
        let phase = self.phase();
        if matches!(phase, Phase::Closed | Phase::Failed) {
            tracing::warn!(kind = message.kind().tag(), ?phase, "session ended; dropping intent");
            return;
        }
        match frames::encode(&message) {
            Ok(text) => self.outbox.borrow_mut().push_back(text),
            Err(e) => tracing::warn!(error = %e, kind = message.kind().tag(), "failed to encode intent"),
        }
    }

    /// Take every queued frame, oldest first.
    pub fn drain_outbox(&self) -> Vec<String> {
        self.outbox.borrow_mut().drain(..).collect()
    }

    // --- Session state ---

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.state.borrow().is_host
    }

    #[must_use]
    pub fn host_id(&self) -> Option<i64> {
        self.state.borrow().host_id
    }

    /// Whether an unexpected close would still be reported.
    #[must_use]
    pub fn should_show_refresh(&self) -> bool {
        self.state.borrow().should_show_refresh
    }

    /// Roster with the host first.
    #[must_use]
    pub fn players(&self) -> Vec<StoredPlayer> {
        self.state.borrow().players.clone()
    }

    #[must_use]
    pub fn player_names(&self) -> Vec<String> {
        self.state.borrow().players.iter().map(|p| p.name.clone()).collect()
    }

    // --- Assets ---

    /// Cached image for asset `obj_id`.
    ///
    /// A miss queues one listing fetch (never more than one in flight) and
    /// returns `None`; the caller draws a placeholder until the runtime
    /// delivers the listing through [`Comms::assets_loaded`]. The host lists
    /// its own uploads, everyone else lists the host's.
    pub fn object_image(&self, obj_id: i64) -> Option<ImageHandle> {
        let mut assets = self.assets.borrow_mut();
        if let Some(image) = assets.get(obj_id) {
            return Some(image);
        }
        let scope = if self.is_host() {
            AssetScope::Owned
        } else {
            AssetScope::SharedBy(self.host_id()?)
        };
        if assets.begin_load(scope) {
            tracing::debug!(obj_id, ?scope, "asset miss; queued listing fetch");
        }
        None
    }

    /// Natural size of a cached asset, when known.
    #[must_use]
    pub fn asset_size(&self, obj_id: i64) -> Option<(u32, u32)> {
        self.assets.borrow().get(obj_id).and_then(|image| image.size)
    }

    /// The listing fetch the runtime should perform, if one is queued.
    pub fn take_asset_request(&self) -> Option<AssetScope> {
        self.assets.borrow_mut().take_pending()
    }

    pub fn assets_loaded(&self, images: Vec<Image>) {
        tracing::debug!(count = images.len(), "asset listing loaded");
        self.assets.borrow_mut().complete(images);
    }

    pub fn assets_failed(&self) {
        tracing::warn!("asset listing fetch failed");
        self.assets.borrow_mut().fail();
    }
}

impl std::fmt::Debug for Comms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comms")
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("queued", &self.outbox.borrow().len())
            .finish_non_exhaustive()
    }
}
