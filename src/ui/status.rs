use crate::app::{App, Focus, Lifecycle};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style): (Cow<'_, str>, _) = if let Some((msg, _)) = &app.status_message {
        let style = if matches!(app.lifecycle, Lifecycle::Disconnected { .. }) {
            app.style("status_error")
        } else {
            app.style("status_bar")
        };
        (Cow::Borrowed(&**msg), style)
    } else {
        let hints = match (&app.lifecycle, app.focus) {
            (_, Focus::Filter) => "Type to filter | Enter apply | Esc done | Ctrl+u clear",
            (_, Focus::Channels) => {
                "[j/k]move [Enter]open [a]dd [Tab]content [r]eload [?]help [q]uit"
            }
            (Lifecycle::Broken(_), _) => "[d]elete channel [Tab]channels [r]eload [?]help [q]uit",
            (Lifecycle::Streaming, _) => {
                "[j/k]scroll [/]filter [o]pen [g/G]top/bottom [Tab]channels [?]help [q]uit"
            }
            _ => "[r]eload [Tab]channels [?]help [q]uit",
        };
        (Cow::Borrowed(hints), app.style("status_bar"))
    };

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}
