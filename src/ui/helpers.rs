//! Background tasks spawned from the UI layer, and small shared helpers.
//!
//! Every task reports back through an [`AppEvent`]; none of them touch
//! session state directly.

use crate::app::{App, AppEvent};
use crate::channel::{await_ready, ChannelId, NewChannel};
use crate::transport::{connect, http, spawn_link};
use crate::util::validate_link_for_open;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panic inside a spawned task would otherwise vanish into the runtime;
/// here it becomes `Err(panic_message)` so the task can report it.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

async fn report_panic(tx: &mpsc::Sender<AppEvent>, task: &'static str, error: String) {
    tracing::error!(task, error = %error, "Background task panicked");
    let _ = tx.send(AppEvent::TaskPanicked { task, error }).await;
}

async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Start a connect attempt through the readiness gate.
///
/// Supersedes any attempt still running. The result arrives as
/// [`AppEvent::Connected`] or [`AppEvent::ConnectFailed`].
pub(super) fn spawn_connect(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let attempt = app.begin_connect();
    let policy = app.config.ready_policy();
    let url = app.endpoints.ws_url().clone();
    let tx = event_tx.clone();

    tracing::debug!(attempt, url = %url, "Waiting for channel socket");

    app.connect_handle = Some(tokio::spawn(async move {
        match catch_task_panic(async {
            let url = &url;
            match await_ready(policy, || connect(url)).await {
                Ok(socket) => {
                    let link = spawn_link(socket, attempt, tx.clone());
                    send_event(&tx, AppEvent::Connected(link), "Connected").await;
                }
                Err(error) => {
                    let event = AppEvent::ConnectFailed { attempt, error };
                    send_event(&tx, event, "ConnectFailed").await;
                }
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => report_panic(&tx, "connect", panic_msg).await,
        }
    }));
}

/// Fetch the markers of the page being loaded.
pub(super) fn spawn_directory_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.directory_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous channel list load");
    }

    let url = app.endpoints.page_for(app.page_channel);
    let client = app.http_client.clone();
    let tx = event_tx.clone();

    app.directory_handle = Some(tokio::spawn(async move {
        match catch_task_panic(async {
            let result = http::fetch_directory(&client, &url)
                .await
                .map_err(|e| e.to_string());
            send_event(&tx, AppEvent::DirectoryLoaded(result), "DirectoryLoaded").await;
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => report_panic(&tx, "directory_load", panic_msg).await,
        }
    }));
}

/// Follow the delete action of a broken channel.
pub(super) fn spawn_delete(app: &App, channel: ChannelId, event_tx: &mpsc::Sender<AppEvent>) {
    let url = app.endpoints.delete_url(channel);
    let client = app.http_client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(async {
            match http::delete_channel(&client, &url).await {
                Ok(()) => {
                    send_event(&tx, AppEvent::ChannelDeleted { channel }, "ChannelDeleted").await;
                }
                Err(e) => {
                    let event = AppEvent::ChannelDeleteFailed {
                        channel,
                        error: e.to_string(),
                    };
                    send_event(&tx, event, "ChannelDeleteFailed").await;
                }
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => report_panic(&tx, "delete_channel", panic_msg).await,
        }
    });
}

/// Post a new channel to the server's add action.
pub(super) fn spawn_add_channel(
    app: &App,
    channel: NewChannel,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let url = app.endpoints.add_channel_url();
    let client = app.http_client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(async {
            let name = channel.name.clone();
            match http::add_channel(&client, &url, &channel).await {
                Ok(()) => {
                    send_event(&tx, AppEvent::ChannelAdded { name }, "ChannelAdded").await;
                }
                Err(e) => {
                    let event = AppEvent::ChannelAddFailed {
                        name,
                        error: e.to_string(),
                    };
                    send_event(&tx, event, "ChannelAddFailed").await;
                }
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => report_panic(&tx, "add_channel", panic_msg).await,
        }
    });
}

/// Open the link of the item at the top of the content panel.
pub(super) fn open_item_link(app: &mut App) {
    let Some(link) = app.item_in_view().map(|item| item.link.clone()) else {
        app.set_status("No item in view");
        return;
    };

    // Item links come from third-party feeds; validate before open::that().
    match validate_link_for_open(&link, Some(app.endpoints.base())) {
        Ok(url) => {
            if let Err(e) = open::that(url.as_str()) {
                app.set_status(format!("Failed to open browser: {}", e));
            }
        }
        Err(e) => app.set_status(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_through_results() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_extracts_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom {}", 1) }).await;
        assert_eq!(result, Err("boom 1".to_string()));

        let result: Result<(), String> = catch_task_panic(async { panic!("static") }).await;
        assert_eq!(result, Err("static".to_string()));
    }
}
