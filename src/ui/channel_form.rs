//! Add-channel form overlay.

use crate::app::App;
use crate::channel::{ChannelForm, FIELDS};
use crate::util::display_width;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

const LABEL_WIDTH: usize = 20;

/// End of `value` that fits in `width` columns; typing happens at the end.
fn tail(value: &str, width: usize) -> &str {
    if display_width(value) <= width {
        return value;
    }
    let mut start = value.len();
    let mut used = 0;
    for (idx, c) in value.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &value[start..]
}

pub(super) fn render(f: &mut Frame, app: &App, form: &ChannelForm) {
    let area = f.area();
    let width = 72u16.min(area.width.saturating_sub(4));
    let height = (FIELDS.len() as u16 + 5).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 30 || overlay.height < 6 {
        return;
    }

    // Borders, label and cursor
    let value_width = (overlay.width as usize).saturating_sub(LABEL_WIDTH + 4);

    let mut lines: Vec<Line> = FIELDS
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == form.focused();
            let label_style = if focused {
                app.style("filter_label")
            } else {
                app.style("content_placeholder")
            };
            let mut spans = vec![
                Span::styled(format!("{:>w$} ", field.label, w = LABEL_WIDTH - 1), label_style),
                Span::styled(tail(form.value(i), value_width), app.style("filter_input")),
            ];
            if focused {
                spans.push(Span::styled("_", app.style("filter_input")));
            }
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(match &form.error {
        Some(error) => Line::from(Span::styled(error.as_str(), app.style("channel_broken"))),
        None => Line::from(""),
    });
    lines.push(Line::from(Span::styled(
        "(Tab) Next  (Enter) Add  (Esc) Cancel",
        app.style("content_placeholder"),
    )));

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(" Add Channel "),
        )
        .style(app.style("overlay_body"));
    f.render_widget(paragraph, overlay);
}
