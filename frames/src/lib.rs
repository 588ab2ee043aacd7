//! Wire model and JSON codec for the tabletop session channel.
//!
//! This crate owns the representation shared by the client core (`canvas`)
//! and the native runtime. Every frame after the handshake is a JSON object
//! with exactly one key: the key names the message kind and the value is its
//! payload. That shape maps directly onto serde's externally tagged enum
//! encoding, so [`Message`] serializes to the wire format without any custom
//! glue. Decoding goes through [`decode`] so unknown or malformed frames are
//! reported with a typed [`CodecError`] instead of a bare serde error.
//!
//! The handshake that precedes the JSON traffic is two raw text frames: the
//! caller's auth token, then the session identifier ([`handshake_frames`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`decode`] and [`encode`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame text is not valid JSON.
    #[error("invalid json frame: {0}")]
    Json(#[source] serde_json::Error),
    /// The frame is valid JSON but not an object.
    #[error("frame is not a json object")]
    NotAnObject,
    /// The frame is an object with no keys, so it carries no tag.
    #[error("frame has no message tag")]
    Empty,
    /// The tag does not name a known message kind.
    #[error("unknown message tag: {0}")]
    UnknownTag(String),
    /// The tag is known but its payload does not match the expected shape.
    #[error("invalid payload for {tag}: {source}")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Vector shape of a token.
///
/// Transported by variant name (`"Circle"`, `"Square"`, ...). `None` exists on
/// the wire but is never placed on the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    #[default]
    None,
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl TokenKind {
    /// Parse a kind from its case-insensitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "circle" => Some(Self::Circle),
            "square" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            "diamond" => Some(Self::Diamond),
            _ => None,
        }
    }
}

/// Payload of `PlaceToken`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPlacement {
    /// Client-minted UUID v4 string.
    pub id: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: TokenKind,
    /// Left edge of the token's cell in board units.
    pub x: i64,
    /// Top edge of the token's cell in board units.
    pub y: i64,
    /// CSS colour string, e.g. `"#ff0000"`.
    pub colour: String,
    /// Player allowed to move this token besides the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

/// Payload of `Movement`: a per-press grid delta for one token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement id, minted by the sender and echoed by the server.
    pub id: String,
    pub token_id: String,
    pub dx: i64,
    pub dy: i64,
}

/// Payload of `PlaceObj`: an image asset placed on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjPlacement {
    /// Placement id. Absent on a client's placement request; assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Id of the uploaded image asset.
    pub obj_id: i64,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

/// Payload of `MoveObj`: the committed pose of a placed object after a drag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjMove {
    /// Placement id of the object.
    pub obj_id: String,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// One JSON frame on the session channel.
///
/// | Variant | Direction |
/// |---|---|
/// | `PlaceToken`, `DeleteToken`, `Movement`, `SetController`, `RenameToken`, `PlaceObj`, `DeleteObj` | both |
/// | `MoveObj` | client → server (applied if echoed) |
/// | `Connect`, `Disconnect`, `FailedConnection` | server → client |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    PlaceToken(TokenPlacement),
    DeleteToken {
        token_id: String,
    },
    Movement(Movement),
    SetController {
        token_id: String,
        new_controller: String,
    },
    RenameToken {
        token_id: String,
        name: String,
    },
    PlaceObj(ObjPlacement),
    DeleteObj {
        obj_id: String,
    },
    MoveObj(ObjMove),
    Connect {
        username: String,
        host: bool,
        /// Account id of the session host, used to list the host's shared assets.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_id: Option<i64>,
    },
    Disconnect {
        username: String,
    },
    FailedConnection {
        reason: String,
    },
}

/// Fieldless discriminant of [`Message`], used as a dispatch key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    PlaceToken,
    DeleteToken,
    Movement,
    SetController,
    RenameToken,
    PlaceObj,
    DeleteObj,
    MoveObj,
    Connect,
    Disconnect,
    FailedConnection,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::PlaceToken,
        Self::DeleteToken,
        Self::Movement,
        Self::SetController,
        Self::RenameToken,
        Self::PlaceObj,
        Self::DeleteObj,
        Self::MoveObj,
        Self::Connect,
        Self::Disconnect,
        Self::FailedConnection,
    ];

    /// The JSON key naming this kind on the wire.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::PlaceToken => "PlaceToken",
            Self::DeleteToken => "DeleteToken",
            Self::Movement => "Movement",
            Self::SetController => "SetController",
            Self::RenameToken => "RenameToken",
            Self::PlaceObj => "PlaceObj",
            Self::DeleteObj => "DeleteObj",
            Self::MoveObj => "MoveObj",
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::FailedConnection => "FailedConnection",
        }
    }

    /// Look up a kind by its wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl Message {
    /// The dispatch key of this message.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::PlaceToken(_) => MessageKind::PlaceToken,
            Self::DeleteToken { .. } => MessageKind::DeleteToken,
            Self::Movement(_) => MessageKind::Movement,
            Self::SetController { .. } => MessageKind::SetController,
            Self::RenameToken { .. } => MessageKind::RenameToken,
            Self::PlaceObj(_) => MessageKind::PlaceObj,
            Self::DeleteObj { .. } => MessageKind::DeleteObj,
            Self::MoveObj(_) => MessageKind::MoveObj,
            Self::Connect { .. } => MessageKind::Connect,
            Self::Disconnect { .. } => MessageKind::Disconnect,
            Self::FailedConnection { .. } => MessageKind::FailedConnection,
        }
    }
}

// =============================================================================
// CODEC
// =============================================================================

/// Serialize a message into a single-key JSON frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serde rejects the value.
pub fn encode(message: &Message) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(CodecError::Encode)
}

/// Decode one JSON frame into a [`Message`].
///
/// # Errors
///
/// - [`CodecError::Json`] for text that is not JSON.
/// - [`CodecError::NotAnObject`] / [`CodecError::Empty`] for frames without a tag.
/// - [`CodecError::UnknownTag`] when the first key is not a known kind.
/// - [`CodecError::Payload`] when the payload does not fit the kind.
pub fn decode(text: &str) -> Result<Message, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(CodecError::Json)?;
    let Value::Object(map) = value else {
        return Err(CodecError::NotAnObject);
    };
    let Some(tag) = map.keys().next().cloned() else {
        return Err(CodecError::Empty);
    };
    if MessageKind::from_tag(&tag).is_none() {
        return Err(CodecError::UnknownTag(tag));
    }
    serde_json::from_value(Value::Object(map)).map_err(|source| CodecError::Payload { tag, source })
}

/// The two raw frames sent immediately after the transport opens:
/// the auth token, then the session identifier.
#[must_use]
pub fn handshake_frames(token: &str, game: &str) -> [String; 2] {
    [token.to_owned(), game.to_owned()]
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
