//! Native runtime for the shared tabletop board.
//!
//! The interactive core lives in the `canvas` crate and the wire protocol in
//! `frames`. This package supplies what a host environment provides around
//! them: configuration, the websocket transport, the HTTP asset API, console
//! commands and the per-session actor loop that feeds all of it into
//! [`canvas::engine::Engine`].

pub mod assets;
pub mod command;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
