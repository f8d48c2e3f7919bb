//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Transport and background task event processing
//! - `render` - Layout and overlays
//! - `helpers` - Background task spawning and shared helpers
//! - `channels` - Channel list widget
//! - `channel_form` - Add-channel form overlay
//! - `content` - Streamed items, placeholders and the broken-channel fallback
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget

mod channel_form;
mod channels;
pub mod content;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

pub use loop_runner::{run, Action};
