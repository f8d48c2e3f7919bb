use crate::app::{App, Focus};
use crate::channel::ChannelHealth;
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the channel list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus == Focus::Channels;

    let items: Vec<ListItem> = if app.directory.is_empty() {
        let text = if app.directory_loaded {
            "No channels"
        } else {
            "Loading..."
        };
        vec![ListItem::new(Span::styled(text, app.style("content_placeholder")))]
    } else {
        app.directory
            .entries()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                // Only a streaming channel counts as active.
                let is_active = app.active_channel() == Some(entry.id);
                let broken = entry.health == ChannelHealth::Broken;

                let mut style = if is_focused && i == app.selected_channel {
                    app.style("channel_selected")
                } else if broken {
                    app.style("channel_broken")
                } else if is_active {
                    app.style("channel_active")
                } else {
                    app.style("channel_normal")
                };
                if is_active {
                    style = style.add_modifier(Modifier::BOLD);
                }

                // Broken channels carry a warning marker
                let line = if broken {
                    Line::from(vec![
                        Span::styled("⚠ ", app.style("channel_broken")),
                        Span::styled(entry.name.clone(), style),
                    ])
                } else {
                    Line::from(Span::styled(entry.name.clone(), style))
                };

                ListItem::new(line)
            })
            .collect()
    };

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let title = format!("Channels ({})", app.directory.len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );

    f.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelDirectory, ChannelEntry, ChannelId};
    use crate::config::Config;
    use crate::keybindings::KeybindingRegistry;
    use crate::transport::{Endpoints, Link};
    use ratatui::{backend::TestBackend, buffer::Cell, style::Color, Terminal};
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn app_on_five(health: ChannelHealth) -> App {
        let endpoints = Endpoints::from_page_url("http://localhost:8080/channels/5").unwrap();
        let mut app = App::new(Config::default(), endpoints, KeybindingRegistry::new()).unwrap();
        app.on_directory_loaded(
            Ok(ChannelDirectory::from_entries(vec![ChannelEntry {
                id: ChannelId::new(5).unwrap(),
                name: "Five".into(),
                health,
            }])),
            Instant::now(),
        );
        app
    }

    fn connect(app: &mut App) -> mpsc::Receiver<crate::channel::FetchRequest> {
        let (tx, rx) = mpsc::channel(8);
        let attempt = app.begin_connect();
        app.on_connected(Link::detached(attempt, tx), Instant::now());
        rx
    }

    /// First cell of `name` in the sidebar.
    fn name_cell(app: &App, name: &str) -> Cell {
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal.draw(|f| render(f, app, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width;
        for y in 0..buffer.area.height {
            let row: String = (0..width).map(|x| buffer[(x, y)].symbol()).collect();
            if let Some(col) = row.find(name) {
                let x = row[..col].chars().count() as u16;
                return buffer[(x, y)].clone();
            }
        }
        panic!("{name} not drawn");
    }

    #[tokio::test]
    async fn test_streaming_channel_is_marked_active() {
        let mut app = app_on_five(ChannelHealth::Healthy);
        let _rx = connect(&mut app);
        assert_eq!(app.active_channel(), ChannelId::new(5));

        let cell = name_cell(&app, "Five");
        assert!(cell.modifier.contains(Modifier::BOLD));
        assert_eq!(cell.fg, app.style("channel_active").fg.unwrap());
    }

    #[tokio::test]
    async fn test_broken_open_channel_is_not_marked_active() {
        let mut app = app_on_five(ChannelHealth::Broken);
        let _rx = connect(&mut app);
        assert_eq!(app.page_channel, ChannelId::new(5));

        let cell = name_cell(&app, "Five");
        assert!(!cell.modifier.contains(Modifier::BOLD));
        assert_eq!(cell.fg, app.style("channel_broken").fg.unwrap());
    }

    #[tokio::test]
    async fn test_channel_not_active_before_connection() {
        let app = app_on_five(ChannelHealth::Healthy);
        let cell = name_cell(&app, "Five");
        assert!(!cell.modifier.contains(Modifier::BOLD));
        assert_eq!(cell.fg, app.style("channel_normal").fg.unwrap_or(Color::Reset));
    }
}
