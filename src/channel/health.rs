//! Channel health, read from the markers the server puts in its pages.
//!
//! Every channel page carries a navigation list where each channel is an
//! element with id `channel-<id>`. A channel whose source failed validation
//! gets the `text-danger` class on that element. Health is read from these
//! markers once per page load and never changes from streamed data.

use super::types::ChannelId;
use scraper::{Html, Selector};

/// Element id prefix of a channel's navigation link.
pub const LINK_ID_PREFIX: &str = "channel-";

/// Class that flags a broken channel.
pub const BROKEN_CLASS: &str = "text-danger";

/// Text shown in place of the content of a broken channel.
pub const BROKEN_MESSAGE: &str =
    "Oops! Looks like channel is broken due to invalid source or parsing rule.";

/// Label of the single action offered for a broken channel.
pub const DELETE_ACTION_LABEL: &str = "Delete this channel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelHealth {
    Healthy,
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub id: ChannelId,
    pub name: String,
    pub health: ChannelHealth,
}

/// Fallback shown for a broken channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenChannelView {
    pub channel: ChannelId,
    pub message: &'static str,
    pub action_label: &'static str,
    /// Server path that deletes the channel when followed.
    pub delete_path: String,
}

/// What a page load should do with a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Streaming(ChannelId),
    Fallback(BrokenChannelView),
}

/// Path that deletes a channel on the server.
pub fn delete_path(channel: ChannelId) -> String {
    format!("/deletechannel/{}", channel)
}

/// Channels known from the current page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDirectory {
    entries: Vec<ChannelEntry>,
}

impl ChannelDirectory {
    pub fn from_entries(entries: Vec<ChannelEntry>) -> Self {
        Self { entries }
    }

    /// Collect channel markers from a server page.
    ///
    /// Elements whose id does not end in a positive integer are skipped.
    /// Duplicate ids keep the first occurrence.
    pub fn from_html(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let selector = match Selector::parse(&format!("[id^=\"{}\"]", LINK_ID_PREFIX)) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };

        let mut entries: Vec<ChannelEntry> = Vec::new();
        for el in doc.select(&selector) {
            let Some(raw_id) = el
                .value()
                .id()
                .and_then(|id| id.strip_prefix(LINK_ID_PREFIX))
            else {
                continue;
            };
            let Ok(id) = raw_id.parse::<ChannelId>() else {
                tracing::debug!(element_id = raw_id, "Skipping marker with non-numeric id");
                continue;
            };
            if entries.iter().any(|e| e.id == id) {
                continue;
            }

            let health = if el.value().classes().any(|c| c == BROKEN_CLASS) {
                ChannelHealth::Broken
            } else {
                ChannelHealth::Healthy
            };
            let name = el.text().collect::<Vec<_>>().join(" ");
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            let name = if name.is_empty() {
                format!("Channel {}", id)
            } else {
                name
            };

            entries.push(ChannelEntry { id, name, health });
        }

        tracing::debug!(
            channels = entries.len(),
            broken = entries
                .iter()
                .filter(|e| e.health == ChannelHealth::Broken)
                .count(),
            "Parsed channel markers"
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: ChannelId) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: ChannelId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Health of a channel. Channels without a marker count as healthy.
    pub fn health(&self, id: ChannelId) -> ChannelHealth {
        self.get(id)
            .map(|e| e.health)
            .unwrap_or(ChannelHealth::Healthy)
    }

    pub fn is_broken(&self, id: ChannelId) -> bool {
        self.health(id) == ChannelHealth::Broken
    }

    /// Decide whether a page load streams the channel or shows the fallback.
    pub fn activate(&self, id: ChannelId) -> Activation {
        if self.is_broken(id) {
            Activation::Fallback(BrokenChannelView {
                channel: id,
                message: BROKEN_MESSAGE,
                action_label: DELETE_ACTION_LABEL,
                delete_path: delete_path(id),
            })
        } else {
            Activation::Streaming(id)
        }
    }

    /// Forget a channel (after it was deleted on the server).
    pub fn remove(&mut self, id: ChannelId) -> Option<ChannelEntry> {
        let idx = self.position(id)?;
        Some(self.entries.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
<html><body>
  <nav class="nav flex-column">
    <a id="channel-1" class="nav-link" href="/channels/1">Habr</a>
    <a id="channel-2" class="nav-link text-danger" href="/channels/2">  Ubuntu
       Planet </a>
    <a id="channel-x" class="nav-link" href="/channels/x">Junk</a>
    <a id="channel-7" class="nav-link" href="/channels/7"></a>
  </nav>
  <div id="main-content"></div>
  <input id="filter" type="text">
</body></html>
"#;

    fn id(raw: u32) -> ChannelId {
        ChannelId::new(raw).unwrap()
    }

    #[test]
    fn test_parses_markers_in_page_order() {
        let dir = ChannelDirectory::from_html(PAGE);
        assert_eq!(
            dir.entries(),
            &[
                ChannelEntry {
                    id: id(1),
                    name: "Habr".into(),
                    health: ChannelHealth::Healthy
                },
                ChannelEntry {
                    id: id(2),
                    name: "Ubuntu Planet".into(),
                    health: ChannelHealth::Broken
                },
                ChannelEntry {
                    id: id(7),
                    name: "Channel 7".into(),
                    health: ChannelHealth::Healthy
                },
            ]
        );
    }

    #[test]
    fn test_is_broken_from_marker() {
        let dir = ChannelDirectory::from_html(PAGE);
        assert!(dir.is_broken(id(2)));
        assert!(!dir.is_broken(id(1)));
        // No marker at all: treated as healthy.
        assert!(!dir.is_broken(id(99)));
    }

    #[test]
    fn test_activate_broken_gives_fallback_with_delete_action() {
        let dir = ChannelDirectory::from_html(PAGE);
        match dir.activate(id(2)) {
            Activation::Fallback(view) => {
                assert_eq!(view.channel, id(2));
                assert_eq!(view.delete_path, "/deletechannel/2");
                assert_eq!(view.action_label, "Delete this channel");
                assert!(view.message.contains("broken"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_activate_healthy_streams() {
        let dir = ChannelDirectory::from_html(PAGE);
        assert_eq!(dir.activate(id(1)), Activation::Streaming(id(1)));
    }

    #[test]
    fn test_page_without_markers() {
        let dir = ChannelDirectory::from_html("<html><body><p>nothing</p></body></html>");
        assert!(dir.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut dir = ChannelDirectory::from_html(PAGE);
        let removed = dir.remove(id(2)).unwrap();
        assert_eq!(removed.name, "Ubuntu Planet");
        assert_eq!(dir.len(), 2);
        assert!(dir.remove(id(2)).is_none());
    }
}
