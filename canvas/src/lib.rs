//! Rendering and synchronization core for the shared tabletop board.
//!
//! This crate owns everything between raw input events and the session
//! channel: the pan/zoom viewport and its render-listener registry, the token
//! and object interaction controllers, the popup affordances they anchor to
//! board entities, and the `Comms` session channel that turns intents into
//! wire messages and routes inbound messages back to the controllers. It is
//! single-threaded and performs no I/O; the host drives it by feeding
//! transport text and input events into [`engine::Engine`] and draining the
//! outbox it fills.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::Engine`] and the [`engine::Action`]s it returns |
//! | [`viewport`] | Screen/board coordinates, pan/zoom, grid and render scheduling |
//! | [`registry`] | Keyed listener registry with drop-to-unregister subscriptions |
//! | [`comms`] | Session channel state machine, listener dispatch and outbox |
//! | [`assets`] | Single-flight image cache keyed by asset id |
//! | [`tokens`] | Token controller: hover, selection, tentative movement |
//! | [`objects`] | Object controller: hover, selection, resize/move drags |
//! | [`resize`] | Resize and snap math for object drags |
//! | [`hit`] | Control-point hit-testing and drag directions |
//! | [`popup`] | Anchored popup buttons and the controller options menu |
//! | [`doc`] | Token and placed-object model types |
//! | [`input`] | Input event types, place modes and cursors |
//! | [`render`] | Drawing routines for grid, tokens, objects and popups |
//! | [`surface`] | Drawing surface trait and the recording implementation |
//! | [`consts`] | Shared numeric constants |

pub mod assets;
pub mod comms;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod objects;
pub mod popup;
pub mod registry;
pub mod render;
pub mod resize;
pub mod surface;
pub mod tokens;
pub mod viewport;
