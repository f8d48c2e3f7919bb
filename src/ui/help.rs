//! Help overlay listing the key bindings in effect.
//!
//! Bindings are read from the registry, so config overrides show up here.
//! The add-channel form reads its keys directly and is listed last.

use crate::app::App;
use crate::keybindings::Context;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: [Context; 5] = [
    Context::Global,
    Context::Channels,
    Context::Content,
    Context::Filter,
    Context::Broken,
];

const FORM_KEYS: [(&str, &str); 5] = [
    ("Tab / Down", "Next field"),
    ("S-Tab / Up", "Previous field"),
    ("Backspace", "Delete last character"),
    ("Enter", "Add the channel"),
    ("Esc", "Cancel"),
];

const KEY_COLUMN: usize = 14;

fn binding_line(app: &App, key: &str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key:<KEY_COLUMN$}"), app.style("filter_label")),
        Span::raw(description),
    ])
}

fn heading_line(app: &App, title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        app.style("help_heading").add_modifier(Modifier::BOLD),
    ))
}

/// One heading per context with bindings, then the form keys.
fn help_lines(app: &App) -> Vec<Line<'static>> {
    let bindings = app.keybindings.all_bindings();
    let mut lines = Vec::new();

    for ctx in SECTIONS {
        let mut section = bindings.iter().filter(|(c, ..)| *c == ctx).peekable();
        if section.peek().is_none() {
            continue;
        }
        lines.push(heading_line(app, ctx.label()));
        lines.extend(section.map(|(_, key, _, description)| binding_line(app, key, *description)));
        lines.push(Line::default());
    }

    lines.push(heading_line(app, "Add channel form"));
    lines.extend(
        FORM_KEYS
            .iter()
            .map(|(key, description)| binding_line(app, key, *description)),
    );
    lines
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered(f.area(), 70, 80);
    if overlay.width < 24 || overlay.height < 6 {
        return;
    }

    let lines = help_lines(app);
    let rows = overlay.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(rows);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let title = if max_scroll == 0 {
        " Keys (? to close) ".to_string()
    } else {
        let last = (scroll + rows).min(lines.len());
        format!(" Keys {}-{} of {} ", scroll + 1, last, lines.len())
    };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(title);
    if scroll < max_scroll {
        block = block.title_bottom(Span::styled(
            " j/k scroll, Esc close ",
            app.style("content_placeholder"),
        ));
    }

    f.render_widget(Clear, overlay);
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(app.style("overlay_body"))
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
        overlay,
    );
}
