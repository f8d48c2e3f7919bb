//! Background task event processing.
//!
//! Routes each [`AppEvent`] to the session, then starts whatever follow-up
//! task the new state needs.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::{spawn_connect, spawn_directory_load};

pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    let now = Instant::now();
    match event {
        AppEvent::Connected(link) => app.on_connected(link, now),
        AppEvent::ConnectFailed { attempt, error } => app.on_connect_failed(attempt, error),
        AppEvent::Frame { link, payload } => app.on_frame(link, &payload),
        AppEvent::Disconnected { link, reason } => app.on_disconnected(link, reason),
        AppEvent::DirectoryLoaded(result) => app.on_directory_loaded(result, now),
        AppEvent::ChannelDeleted { channel } => {
            app.on_channel_deleted(channel);
            // The server answers a delete by sending the browser to the index.
            spawn_directory_load(app, event_tx);
            if app.needs_connection() {
                spawn_connect(app, event_tx);
            }
        }
        AppEvent::ChannelDeleteFailed { channel, error } => {
            app.on_channel_delete_failed(channel, &error);
        }
        AppEvent::ChannelAdded { name } => {
            app.on_channel_added(&name);
            spawn_directory_load(app, event_tx);
        }
        AppEvent::ChannelAddFailed { name, error } => app.on_channel_add_failed(&name, &error),
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Task panicked");
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}
