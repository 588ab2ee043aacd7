//! Websocket transport.
//!
//! The socket is split once: a writer task drains outbound text from an
//! unbounded channel into the sink, and a reader task forwards inbound text
//! frames as [`TransportEvent`]s. Only `String`s cross the task boundary, so
//! the session future that owns the (single-threaded) engine never touches
//! the socket.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ClientError;

/// Inbound transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    /// The socket closed or errored. Always the last event.
    Closed,
}

/// Channel ends of an open websocket.
pub struct Transport {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Open the websocket at `url` and spawn its reader and writer tasks.
///
/// # Errors
///
/// Returns [`ClientError::Connect`] if the handshake fails.
pub async fn connect(url: &str) -> Result<Transport, ClientError> {
    let (stream, _) = connect_async(url).await.map_err(|error| ClientError::Connect(Box::new(error)))?;
    tracing::info!(%url, "websocket connected");

    let (mut sink, mut source) = stream.split();
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
    let (events_tx, events) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(text) = outgoing_rx.recv().await {
            if let Err(error) = sink.send(Message::Text(text.into())).await {
                tracing::warn!(%error, "websocket send failed");
                break;
            }
        }
        if let Err(error) = sink.close().await {
            tracing::debug!(%error, "websocket close failed");
        }
    });

    tokio::spawn(async move {
        while let Some(message) = source.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if events_tx.send(TransportEvent::Text(text.as_str().to_owned())).is_err() {
                        return;
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "websocket close frame");
                    break;
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(%error, "websocket receive failed");
                    break;
                }
            }
        }
        if events_tx.send(TransportEvent::Closed).is_err() {
            tracing::debug!("session ended before socket close");
        }
    });

    Ok(Transport { outgoing, events })
}
