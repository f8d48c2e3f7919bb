//! Terminal viewer for channel feeds streamed incrementally over a WebSocket.
//!
//! - [`channel`] - streaming core: gate, health, debounce, cursor, stream, view
//! - [`transport`] - WebSocket link and the HTTP side channel
//! - [`app`] - session state driven by the event loop
//! - [`ui`] - terminal front end

pub mod app;
pub mod channel;
pub mod config;
pub mod keybindings;
pub mod theme;
pub mod transport;
pub mod ui;
pub mod util;
