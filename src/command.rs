//! Console commands for the headless client.
//!
//! Each stdin line is one command, parsed with clap the same way the binary's
//! own arguments are. `help` prints the command list.

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

use canvas::input::Button;
use clap::{Parser, Subcommand, ValueEnum};
use frames::TokenKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

/// One console command. Coordinates are screen pixels.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Place tokens of this shape and colour on host clicks.
    Place {
        #[arg(value_parser = parse_kind)]
        kind: TokenKind,
        colour: String,
    },
    /// Place the image asset with this id on host clicks.
    Object { obj_id: i64 },
    /// Leave placement mode.
    Select,
    /// Primary press and release at one point.
    Click {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Press a mouse button.
    Down {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(long, value_enum, default_value_t = MouseButton::Primary)]
        button: MouseButton,
        #[arg(long)]
        shift: bool,
    },
    /// Move the pointer.
    Move {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Release the pressed button.
    Up {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Key press by browser key name (`ArrowLeft`, `Escape`, `Home`).
    Key { name: String },
    /// One wheel notch, centred on the viewport unless a point is given.
    Zoom {
        #[arg(value_enum)]
        direction: ZoomDirection,
        #[arg(allow_negative_numbers = true, requires = "y")]
        x: Option<f64>,
        #[arg(allow_negative_numbers = true)]
        y: Option<f64>,
    },
    /// Drag the board by a screen delta.
    Pan {
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Reset pan and zoom.
    Reset,
    /// Confirm the pending delete.
    Confirm,
    /// Answer the pending rename prompt.
    Rename {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// List connected players.
    Players,
    /// List tokens on the board.
    Tokens,
    /// Disconnect and exit.
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

impl From<MouseButton> for Button {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Primary => Self::Primary,
            MouseButton::Middle => Self::Middle,
            MouseButton::Secondary => Self::Secondary,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    /// Parse failure or a `help` request; the message is ready to print.
    #[error("{0}")]
    Usage(String),
}

impl Command {
    /// Parse one console line.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Empty`] for blank lines and
    /// [`CommandError::Usage`] for anything clap rejects.
    pub fn parse_line(line: &str) -> Result<Self, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Err(CommandError::Empty);
        }
        Line::try_parse_from(words)
            .map(|parsed| parsed.command)
            .map_err(|e| CommandError::Usage(e.render().to_string()))
    }
}

fn parse_kind(raw: &str) -> Result<TokenKind, String> {
    TokenKind::from_name(raw).ok_or_else(|| format!("unknown token kind {raw:?}"))
}

/// Read commands from stdin until EOF. Unparseable lines print their usage
/// error and are skipped.
#[must_use]
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(%error, "stdin read failed");
                    break;
                }
            };
            match Command::parse_line(&line) {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(CommandError::Usage(usage)) => eprintln!("{usage}"),
            }
        }
        tracing::debug!("stdin closed");
    });
    rx
}
