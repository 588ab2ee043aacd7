//! Error types for the native runtime.

use crate::config::ConfigError;

/// Errors that end a client run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("transport closed: {0}")]
    Transport(String),

    #[error("asset api error: {0}")]
    Asset(#[from] AssetError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the asset listing and download API.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The HTTP request failed before a response arrived.
    #[error("asset request failed: {0}")]
    Request(String),

    /// The server answered with a failure status or a `status: false` envelope.
    #[error("asset api returned {status}: {msg}")]
    Status { status: u16, msg: String },

    /// The response body did not match the expected shape.
    #[error("asset response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}
