//! Rendered view of a channel.
//!
//! Every item renders as exactly [`NODES_PER_ITEM`] nodes (heading, body,
//! separator). The pagination cursor lives next to the item list and is
//! moved in the same call that changes the list.

use super::cursor::PaginationCursor;
use super::types::FeedItem;

/// Nodes emitted per item: heading, body, separator.
pub const NODES_PER_ITEM: usize = 3;

/// One rendered fragment of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    /// Heading holding a link whose visible text is the item title.
    Heading { title: String, link: String },
    /// Raw description, may carry markup.
    Body(String),
    /// Thematic break between items.
    Separator,
}

/// Turns items into view fragments.
pub struct ViewRenderer;

impl ViewRenderer {
    pub fn fragments(item: &FeedItem) -> [ViewNode; NODES_PER_ITEM] {
        [
            ViewNode::Heading {
                title: item.title.clone(),
                link: item.link.clone(),
            },
            ViewNode::Body(item.description.clone()),
            ViewNode::Separator,
        ]
    }
}

/// Ordered items for the current channel and filter, plus the cursor.
#[derive(Debug, Default)]
pub struct ViewState {
    items: Vec<FeedItem>,
    cursor: PaginationCursor,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every rendered item and rewind the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor.reset();
    }

    /// Append items in received order without touching existing ones.
    pub fn append(&mut self, items: Vec<FeedItem>) {
        let count = items.len();
        self.items.extend(items);
        self.cursor.advance(count);
        debug_assert_eq!(self.cursor.offset(), self.items.len() as u64);
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn node_count(&self) -> usize {
        self.items.len() * NODES_PER_ITEM
    }

    /// Full node sequence, in item order.
    pub fn nodes(&self) -> impl Iterator<Item = ViewNode> + '_ {
        self.items.iter().flat_map(ViewRenderer::fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(tag: &str) -> FeedItem {
        FeedItem {
            title: format!("title-{tag}"),
            link: format!("http://example.com/{tag}"),
            description: format!("<p>body-{tag}</p>"),
        }
    }

    fn heading(tag: &str) -> ViewNode {
        ViewNode::Heading {
            title: format!("title-{tag}"),
            link: format!("http://example.com/{tag}"),
        }
    }

    fn body(tag: &str) -> ViewNode {
        ViewNode::Body(format!("<p>body-{tag}</p>"))
    }

    #[test]
    fn test_append_is_order_preserving() {
        let mut view = ViewState::new();
        view.append(vec![item("a"), item("b"), item("c")]);

        let nodes: Vec<_> = view.nodes().collect();
        assert_eq!(
            nodes,
            vec![
                heading("a"),
                body("a"),
                ViewNode::Separator,
                heading("b"),
                body("b"),
                ViewNode::Separator,
                heading("c"),
                body("c"),
                ViewNode::Separator,
            ]
        );
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let mut view = ViewState::new();
        view.append(vec![item("a")]);
        view.append(vec![item("b")]);
        let titles: Vec<_> = view.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["title-a", "title-b"]);
    }

    #[test]
    fn test_cursor_tracks_node_count() {
        let mut view = ViewState::new();
        view.append(vec![item("a"), item("b")]);
        view.append(vec![]);
        view.append(vec![item("c")]);
        assert_eq!(view.node_count(), 9);
        assert_eq!(view.cursor().offset(), (view.node_count() / NODES_PER_ITEM) as u64);
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut view = ViewState::new();
        view.append(vec![item("a"), item("b")]);
        view.clear();
        assert!(view.is_empty());
        assert_eq!(view.node_count(), 0);
        assert_eq!(view.cursor().offset(), 0);
    }
}
