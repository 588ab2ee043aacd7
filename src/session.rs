//! Per-session actor loop.
//!
//! DESIGN
//! ======
//! The [`Engine`] is single-threaded (`Rc` inside), so it lives in this
//! future and never crosses a task boundary. One `select!` loop drains:
//! - transport events (inbound text, close)
//! - asset listing results from spawned fetch tasks
//! - console commands
//! - a tick that expires unconfirmed movements
//!
//! After every turn the loop repaints if the board changed, starts an asset
//! fetch if the cache asked for one, forwards queued frames to the writer
//! task and publishes the roster to [`Session::watch_players`] subscribers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use canvas::assets::{AssetScope, Image};
use canvas::comms::{Identity, StoredPlayer};
use canvas::doc::TokenId;
use canvas::engine::{Action, DeleteTarget, Engine};
use canvas::input::{Button, Key, Modifiers, PlaceMode, WheelDelta};
use canvas::surface::RecordingSurface;
use canvas::viewport::{ScreenPoint, Viewport};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::assets::{AssetApi, load_images};
use crate::command::{Command, ZoomDirection};
use crate::config::Config;
use crate::error::{AssetError, ClientError};
use crate::transport::{Transport, TransportEvent};

const TICK: Duration = Duration::from_millis(250);

/// Wheel delta of one notch, in pixels.
const WHEEL_NOTCH: f64 = 100.0;

type AssetResult = Result<Vec<Image>, AssetError>;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user asked to quit.
    Quit,
    /// The server refused the session.
    Failed(String),
    /// The socket closed without an explanation.
    Lost,
}

pub struct Session {
    engine: Engine,
    api: Arc<dyn AssetApi>,
    token: String,
    surface: RecordingSurface,
    pending_delete: Option<DeleteTarget>,
    pending_rename: Option<TokenId>,
    assets_tx: mpsc::UnboundedSender<AssetResult>,
    assets_rx: Option<mpsc::UnboundedReceiver<AssetResult>>,
    outcome: Option<Outcome>,
    roster: watch::Sender<Vec<StoredPlayer>>,
}

impl Session {
    #[must_use]
    pub fn new(config: &Config, api: Arc<dyn AssetApi>) -> Self {
        let identity = Identity::new(&config.token, &config.username, &config.game);
        let (width, height) = config.viewport;
        let viewport = Viewport::new(width, height, config.cell_size, config.zoom_step);
        let (assets_tx, assets_rx) = mpsc::unbounded_channel();
        Self {
            engine: Engine::new(identity, viewport),
            api,
            token: config.token.clone(),
            surface: RecordingSurface::new(),
            pending_delete: None,
            pending_rename: None,
            assets_tx,
            assets_rx: Some(assets_rx),
            outcome: None,
            roster: watch::Sender::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Roster as the engine last saw it. Updated after every loop turn, so a
    /// receiver that observes a player knows its `Connect` has been applied.
    #[must_use]
    pub fn watch_players(&self) -> watch::Receiver<Vec<StoredPlayer>> {
        self.roster.subscribe()
    }

    /// Drive the session until it quits, fails or loses the socket.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the writer task stopped while
    /// frames were still queued.
    pub async fn run(
        &mut self,
        transport: Transport,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<Outcome, ClientError> {
        let Transport { outgoing, mut events } = transport;
        let Some(mut assets_rx) = self.assets_rx.take() else {
            return Err(ClientError::Transport("session already ran".to_owned()));
        };

        self.engine.on_open();
        self.flush(&outgoing)?;

        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(TransportEvent::Text(text)) => {
                            tracing::debug!(%text, "recv");
                            let actions = self.engine.on_text(&text);
                            self.handle(actions);
                        }
                        Some(TransportEvent::Closed) | None => {
                            let actions = self.engine.on_close();
                            self.handle(actions);
                            // A refusal already set the outcome.
                            if self.outcome.is_none() {
                                self.outcome = Some(Outcome::Lost);
                            }
                        }
                    }
                }
                Some(result) = assets_rx.recv() => {
                    match result {
                        Ok(images) => {
                            let actions = self.engine.assets_loaded(images);
                            self.handle(actions);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "asset listing failed");
                            self.engine.assets_failed();
                        }
                    }
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => self.execute(command),
                        None => {
                            tracing::debug!("console closed; session continues");
                            commands_open = false;
                        }
                    }
                }
                _ = ticker.tick() => {
                    let actions = self.engine.tick(Instant::now());
                    self.handle(actions);
                }
            }

            self.flush(&outgoing)?;
            self.publish_roster();
            if let Some(outcome) = self.outcome.take() {
                tracing::info!(?outcome, "session finished");
                return Ok(outcome);
            }
        }
    }

    /// Repaint if needed, start a pending asset fetch, then send queued frames.
    fn flush(&mut self, outgoing: &mpsc::UnboundedSender<String>) -> Result<(), ClientError> {
        if self.engine.needs_render() {
            let actions = self.engine.render(&mut self.surface);
            tracing::trace!(commands = self.surface.commands().len(), "repaint");
            self.surface.take();
            self.handle(actions);
        }
        if let Some(scope) = self.engine.take_asset_request() {
            self.spawn_asset_fetch(scope);
        }
        for frame in self.engine.drain_outbox() {
            tracing::debug!(%frame, "send");
            outgoing.send(frame).map_err(|_| ClientError::Transport("writer task stopped".to_owned()))?;
        }
        Ok(())
    }

    fn publish_roster(&self) {
        let players = self.engine.comms().players();
        self.roster.send_if_modified(|current| {
            if *current == players {
                return false;
            }
            *current = players;
            true
        });
    }

    fn spawn_asset_fetch(&self, scope: AssetScope) {
        let api = Arc::clone(&self.api);
        let token = self.token.clone();
        let tx = self.assets_tx.clone();
        tracing::debug!(?scope, "fetching asset listing");
        tokio::spawn(async move {
            let result = load_images(api.as_ref(), &token, scope).await;
            if tx.send(result).is_err() {
                tracing::debug!("session ended before assets arrived");
            }
        });
    }

    fn handle(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::SetCursor(cursor) => tracing::debug!(cursor = cursor.css_name(), "cursor"),
                Action::ConfirmDelete(target) => {
                    println!("delete {target:?}? type `confirm` to proceed");
                    self.pending_delete = Some(target);
                }
                Action::RenameRequested { token_id, current } => {
                    let current = current.as_deref().unwrap_or("(unnamed)");
                    println!("rename token {token_id} (now {current}): type `rename <name>`");
                    self.pending_rename = Some(token_id);
                }
                Action::ConnectionFailed { reason } => {
                    println!("connection refused: {reason}");
                    self.outcome = Some(Outcome::Failed(reason));
                }
                Action::ConnectionLost => {
                    println!("connection lost; restart to reconnect");
                    self.outcome = Some(Outcome::Lost);
                }
                Action::RenderNeeded => {}
            }
        }
    }

    fn execute(&mut self, command: Command) {
        tracing::debug!(?command, "console");
        let actions = match command {
            Command::Place { kind, colour } => {
                self.engine.set_mode(PlaceMode::Token { kind, colour });
                Vec::new()
            }
            Command::Object { obj_id } => {
                self.engine.set_mode(PlaceMode::Object { obj_id });
                Vec::new()
            }
            Command::Select => {
                self.engine.set_mode(PlaceMode::Select);
                Vec::new()
            }
            Command::Click { x, y } => {
                let at = ScreenPoint::new(x, y);
                let mut actions = self.engine.on_pointer_down(at, Button::Primary, Modifiers::default());
                actions.extend(self.engine.on_pointer_up(at));
                actions
            }
            Command::Down { x, y, button, shift } => {
                let modifiers = Modifiers { shift };
                self.engine.on_pointer_down(ScreenPoint::new(x, y), button.into(), modifiers)
            }
            Command::Move { x, y } => self.engine.on_pointer_move(ScreenPoint::new(x, y)),
            Command::Up { x, y } => self.engine.on_pointer_up(ScreenPoint::new(x, y)),
            Command::Key { name } => self.engine.on_key_down(&Key::new(name)),
            Command::Zoom { direction, x, y } => {
                let at = match (x, y) {
                    (Some(x), Some(y)) => ScreenPoint::new(x, y),
                    _ => self.centre(),
                };
                let dy = match direction {
                    ZoomDirection::In => -WHEEL_NOTCH,
                    ZoomDirection::Out => WHEEL_NOTCH,
                };
                self.engine.on_wheel(at, WheelDelta { dy })
            }
            Command::Pan { dx, dy } => {
                let from = self.centre();
                let to = ScreenPoint::new(from.x + dx, from.y + dy);
                let mut actions = self.engine.on_pointer_down(from, Button::Secondary, Modifiers::default());
                actions.extend(self.engine.on_pointer_move(to));
                actions.extend(self.engine.on_pointer_up(to));
                actions
            }
            Command::Reset => self.engine.on_key_down(&Key::new("Home")),
            Command::Confirm => {
                if let Some(target) = self.pending_delete.take() {
                    self.engine.confirm_delete(&target);
                } else {
                    println!("nothing to confirm");
                }
                Vec::new()
            }
            Command::Rename { name } => {
                if let Some(token_id) = self.pending_rename.take() {
                    self.engine.rename_token(&token_id, &name.join(" "))
                } else {
                    println!("no rename pending; click a token's rename button first");
                    Vec::new()
                }
            }
            Command::Players => {
                for player in self.engine.comms().players() {
                    println!("{}{}", player.name, if player.host { " (host)" } else { "" });
                }
                Vec::new()
            }
            Command::Tokens => {
                let tokens = self.engine.tokens();
                for token in tokens.tokens() {
                    let pos = tokens.displayed_position(&token.id).unwrap_or(token.pos);
                    println!(
                        "{} {:?} {} at ({}, {}) name={} controller={}",
                        token.id,
                        token.kind,
                        token.colour,
                        pos.x,
                        pos.y,
                        token.name.as_deref().unwrap_or("-"),
                        token.controller.as_deref().unwrap_or("-"),
                    );
                }
                Vec::new()
            }
            Command::Quit => {
                self.outcome = Some(Outcome::Quit);
                Vec::new()
            }
        };
        self.handle(actions);
    }

    fn centre(&self) -> ScreenPoint {
        let viewport = self.engine.viewport();
        ScreenPoint::new(viewport.width() / 2.0, viewport.height() / 2.0)
    }
}
