//! Render functions for the TUI.
//!
//! Layout: channel list on the left; filter bar, content panel and status
//! bar stacked on the right. Overlays draw last.

use crate::app::{App, ConfirmAction, Focus};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{channel_form, channels, content, help, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(rows[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[1]);

    channels::render(f, app, columns[0]);
    render_filter_bar(f, app, main[0]);
    content::render(f, app, main[1]);
    status::render(f, app, rows[1]);

    if app.show_help {
        help::render(f, app);
    }

    if let Some(ref form) = app.add_form {
        channel_form::render(f, app, form);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, app, confirm);
    }
}

/// Filter input above the content panel.
fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.focus == Focus::Filter;

    let mut spans = vec![Span::styled("Filter: ", app.style("filter_label"))];
    if app.filter_input.is_empty() && !editing {
        let hint = if app.is_streaming() { "press / to filter" } else { "" };
        spans.push(Span::styled(hint, app.style("content_placeholder")));
    } else {
        spans.push(Span::styled(app.filter_input.as_str(), app.style("filter_input")));
    }
    if editing {
        spans.push(Span::styled("_", app.style("filter_input")));
    }

    let border_style = if editing {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };
    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(border_style));
    f.render_widget(paragraph, area);
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let area = f.area();

    let text = match confirm {
        ConfirmAction::DeleteChannel { name, .. } => {
            format!(
                "Delete \"{}\"?\n\nThe channel is removed on the server.\n\n\
                 (y) Confirm  (n/Esc) Cancel",
                name
            )
        }
    };

    // At most 50 chars wide, 7 lines tall
    let width = 50u16.min(area.width.saturating_sub(4));
    let height = 7u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .style(app.style("overlay_body"));

    f.render_widget(paragraph, overlay);
}
