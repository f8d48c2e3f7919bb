//! Content panel: the streamed items of the active channel, or the
//! fallback for a broken one.

use crate::app::{App, Focus, Lifecycle, RenderedContent};
use crate::channel::{FeedItem, ViewNode, ViewRenderer};
use crate::util::{markup_to_text, strip_control_chars, truncate_to_width, wrap_text};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const UNTITLED: &str = "(untitled)";

struct ItemStyles {
    heading: Style,
    link: Style,
    body: Style,
    separator: Style,
}

/// Bring the line cache up to date with the view for `width` columns.
///
/// Appends lines for items added since the last call. The cache is rebuilt
/// from scratch when the view was cleared (new generation), the width
/// changed or the theme changed.
pub fn sync_rendered_lines(app: &mut App, width: usize) {
    let width = width.max(1);
    let generation = app.stream.generation();
    let stale = app.rendered.width != width
        || app.rendered.generation != generation
        || app.rendered.theme != Some(app.theme_variant)
        || app.rendered.items > app.view.len();
    if stale {
        app.rendered = RenderedContent {
            width,
            generation,
            theme: Some(app.theme_variant),
            ..RenderedContent::default()
        };
    }

    let styles = ItemStyles {
        heading: app.style("item_heading"),
        link: app.style("item_link"),
        body: app.style("item_body"),
        separator: app.style("item_separator"),
    };

    let start = app.rendered.items;
    for item in &app.view.items()[start..] {
        let first_line = app.rendered.lines.len();
        app.rendered.item_starts.push(first_line);
        push_item_lines(&mut app.rendered.lines, item, width, &styles);
    }
    app.rendered.items = app.view.len();
}

fn clean(text: &str) -> String {
    strip_control_chars(&markup_to_text(text)).into_owned()
}

fn push_item_lines(
    lines: &mut Vec<Line<'static>>,
    item: &FeedItem,
    width: usize,
    styles: &ItemStyles,
) {
    for node in ViewRenderer::fragments(item) {
        match node {
            ViewNode::Heading { title, link } => {
                let title = clean(&title);
                let title = if title.is_empty() { UNTITLED.to_string() } else { title };
                lines.extend(
                    wrap_text(&title, width)
                        .into_iter()
                        .map(|l| Line::from(Span::styled(l, styles.heading))),
                );
                let link = strip_control_chars(link.trim()).into_owned();
                if !link.is_empty() {
                    lines.push(Line::from(Span::styled(
                        truncate_to_width(&link, width).into_owned(),
                        styles.link,
                    )));
                }
            }
            ViewNode::Body(description) => {
                lines.extend(
                    wrap_text(&clean(&description), width)
                        .into_iter()
                        .map(|l| Line::from(Span::styled(l, styles.body))),
                );
            }
            ViewNode::Separator => {
                lines.push(Line::from(Span::styled("─".repeat(width), styles.separator)));
            }
        }
    }
}

/// Render the content panel
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    // Layout may produce zero-sized rects during extreme resizes
    if area.width < 3 || area.height < 3 {
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    app.viewport_height = area.height.saturating_sub(2) as usize;
    sync_rendered_lines(app, inner_width);
    app.clamp_scroll();

    let border_style = if app.focus == Focus::Content {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(panel_title(app));

    if let Lifecycle::Broken(fallback) = &app.lifecycle {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(fallback.message, app.style("broken_message"))),
            Line::from(""),
            Line::from(Span::styled(
                format!("[ {} ]", fallback.action_label),
                app.style("broken_action"),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press d to delete, Tab for the channel list",
                app.style("content_placeholder"),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    if app.view.is_empty() {
        let paragraph = Paragraph::new(placeholder(app))
            .style(app.style("content_placeholder"))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    }

    let visible = app
        .rendered
        .lines
        .iter()
        .skip(app.scroll_offset)
        .take(app.viewport_height)
        .cloned();
    let paragraph = Paragraph::new(Text::from_iter(visible)).block(block);
    f.render_widget(paragraph, area);
}

fn panel_title(app: &App) -> String {
    let name = app
        .page_channel
        .and_then(|id| app.directory.get(id))
        .map(|e| e.name.as_str())
        .unwrap_or("Channel");
    if app.stream.filter().is_empty() {
        format!(" {} ({}) ", name, app.view.len())
    } else {
        format!(" {} ({}) filter: {} ", name, app.view.len(), app.stream.filter())
    }
}

fn placeholder(app: &App) -> String {
    match &app.lifecycle {
        Lifecycle::AwaitingConnection => format!("\nConnecting to {} ...", app.endpoints.ws_url()),
        Lifecycle::Disconnected { reason } => {
            format!("\nDisconnected: {}\n\nPress r to reload", reason)
        }
        Lifecycle::NoChannel => "\nNo channels on this server".to_string(),
        Lifecycle::Streaming if app.stream.in_flight() => "\nLoading...".to_string(),
        Lifecycle::Streaming if !app.stream.filter().is_empty() => {
            format!("\nNo items match \"{}\"", app.stream.filter())
        }
        Lifecycle::Streaming | Lifecycle::Broken(_) => "\nNo items".to_string(),
    }
}
