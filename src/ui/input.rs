//! Input handling for the TUI.
//!
//! Overlays capture every key while shown (help, the confirm dialog, then
//! the add-channel form).
//! The filter bar takes printable keys while focused. Everything else goes
//! through the keybinding registry for the focused panel.

use crate::app::{App, AppEvent, ConfirmAction, Focus, Lifecycle};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::{
    open_item_link, spawn_add_channel, spawn_connect, spawn_delete, spawn_directory_load,
};
use super::Action;

/// Keybinding context for the focused panel.
fn current_context(app: &App) -> KbContext {
    match app.focus {
        Focus::Channels => KbContext::Channels,
        Focus::Filter => KbContext::Filter,
        Focus::Content if matches!(app.lifecycle, Lifecycle::Broken(_)) => KbContext::Broken,
        Focus::Content => KbContext::Content,
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if app.show_help {
        return handle_help_input(app, code);
    }

    if app.pending_confirm.is_some() {
        return handle_confirm_input(app, code, event_tx);
    }

    if app.add_form.is_some() {
        return handle_form_input(app, code, modifiers, event_tx);
    }

    if app.focus == Focus::Filter {
        return handle_filter_input(app, code, modifiers);
    }

    let context = current_context(app);
    match app.keybindings.action_for_key(code, modifiers, context) {
        Some(action) => dispatch(app, action, event_tx),
        None => Action::Continue,
    }
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while the confirmation dialog is visible.
///
/// y/Y confirms the action, n/N/Esc cancels.
fn handle_confirm_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(ConfirmAction::DeleteChannel { channel, name }) =
                app.pending_confirm.take()
            {
                tracing::info!(channel = %channel, "Deleting broken channel");
                app.set_status(format!("Deleting {}...", name));
                spawn_delete(app, channel, event_tx);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while the add-channel form is open.
///
/// Tab/Down and BackTab/Up move between fields, Enter submits, Esc cancels.
fn handle_form_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let Some(form) = app.add_form.as_mut() else {
        return Action::Continue;
    };
    match code {
        KeyCode::Esc => {
            app.add_form = None;
            app.set_status("Cancelled");
        }
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop(),
        KeyCode::Enter => match form.submit() {
            Ok(channel) => {
                app.add_form = None;
                tracing::info!(name = %channel.name, source = %channel.source, "Adding channel");
                app.set_status(format!("Adding {}...", channel.name));
                spawn_add_channel(app, channel, event_tx);
            }
            Err(e) => form.error = Some(e.to_string()),
        },
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if !form.push(c) {
                app.set_status("Field is full");
            }
        }
        _ => {}
    }
    app.needs_redraw = true;
    Action::Continue
}

/// Handle input while the filter bar has focus.
///
/// Each edit restarts the quiet interval; the refresh itself happens when
/// the debouncer fires or on Enter.
fn handle_filter_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    let now = Instant::now();
    match app.keybindings.action_in_context(code, modifiers, KbContext::Filter) {
        Some(KbAction::Back) => app.focus = Focus::Content,
        Some(KbAction::CommitFilter) => app.commit_filter(now),
        Some(KbAction::ClearFilter) => app.clear_filter(now),
        _ => match code {
            KeyCode::Backspace => app.filter_pop(now),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.filter_push(c, now)
            }
            _ => {}
        },
    }
    Action::Continue
}

fn dispatch(app: &mut App, action: KbAction, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    let now = Instant::now();
    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::CycleFocus => {
            app.focus = match app.focus {
                Focus::Channels => Focus::Content,
                Focus::Content | Focus::Filter => Focus::Channels,
            };
        }
        KbAction::Back => app.focus = Focus::Content,
        KbAction::Select => {
            app.select_channel(now);
            if app.needs_connection() {
                spawn_connect(app, event_tx);
            }
        }
        KbAction::Reload => {
            app.reload();
            app.set_status("Reloading...");
            spawn_directory_load(app, event_tx);
            spawn_connect(app, event_tx);
        }
        KbAction::EditFilter => {
            if app.is_streaming() {
                app.focus = Focus::Filter;
            } else {
                app.set_status("Nothing to filter");
            }
        }
        KbAction::ClearFilter => app.clear_filter(now),
        KbAction::CommitFilter => app.commit_filter(now),
        KbAction::ScrollDown => app.scroll_down(1, now),
        KbAction::ScrollUp => app.scroll_up(1, now),
        KbAction::PageDown => app.scroll_down(app.viewport_height.max(1), now),
        KbAction::PageUp => app.scroll_up(app.viewport_height.max(1), now),
        KbAction::ScrollTop => app.scroll_to_top(now),
        KbAction::ScrollBottom => app.scroll_to_bottom(now),
        KbAction::OpenInBrowser => open_item_link(app),
        KbAction::DeleteChannel => app.request_delete(),
        KbAction::AddChannel => app.open_add_form(),
        KbAction::CycleTheme => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
    }
    Action::Continue
}
