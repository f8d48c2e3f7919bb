use crate::channel::{
    Activation, BrokenChannelView, ChannelDirectory, ChannelEntry, ChannelForm, ChannelId,
    FeedItem, FetchRequest, FilterDebouncer, GateError, ResponseOutcome, ScrollSentinel,
    StreamController, StreamError, ViewState,
};
use crate::config::Config;
use crate::keybindings::KeybindingRegistry;
use crate::theme::{StyleMap, ThemeVariant};
use crate::transport::{http, Endpoints, Link};
use crate::util::MAX_FILTER_LENGTH;
use anyhow::Result;
use ratatui::style::Style;
use ratatui::text::Line;
use std::borrow::Cow;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Page Lifecycle
// ============================================================================

/// Where the current page load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Waiting for the socket and the page markers.
    AwaitingConnection,
    /// Healthy channel streaming over the open link.
    Streaming,
    /// Channel flagged broken; only the delete action is offered.
    Broken(BrokenChannelView),
    /// Link lost or never came up. Reload starts over.
    Disconnected { reason: String },
    /// Server lists no channels.
    NoChannel,
}

/// Focused panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Channels,
    Content,
    Filter,
}

/// Pending confirmation action for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteChannel { channel: ChannelId, name: String },
}

// ============================================================================
// Rendered Content Cache
// ============================================================================

/// Terminal lines for the items in the view.
///
/// Rebuilt when the view is cleared, the width changes or the theme changes;
/// otherwise only newly appended items are rendered.
#[derive(Default)]
pub struct RenderedContent {
    pub width: usize,
    pub generation: u64,
    pub theme: Option<ThemeVariant>,
    /// Number of items already turned into lines.
    pub items: usize,
    pub lines: Vec<Line<'static>>,
    /// First line of each rendered item.
    pub item_starts: Vec<usize>,
}

impl RenderedContent {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Index of the item shown at `line`.
    pub fn item_at(&self, line: usize) -> Option<usize> {
        match self.item_starts.binary_search(&line) {
            Ok(idx) => Some(idx),
            Err(0) => None,
            Err(idx) => Some(idx - 1),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events from transport and background tasks
pub enum AppEvent {
    /// The gate produced an open link for connect attempt `link.id()`.
    Connected(Link),
    /// The gate gave up on connect attempt `attempt`.
    ConnectFailed { attempt: u64, error: GateError },
    /// One inbound frame, in arrival order.
    Frame { link: u64, payload: Vec<u8> },
    Disconnected { link: u64, reason: String },
    /// Page markers fetched (or not).
    DirectoryLoaded(Result<ChannelDirectory, String>),
    ChannelDeleted { channel: ChannelId },
    ChannelDeleteFailed { channel: ChannelId, error: String },
    ChannelAdded { name: String },
    ChannelAddFailed { name: String, error: String },
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "connect", "delete_channel")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central session state
pub struct App {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub endpoints: Endpoints,
    pub keybindings: KeybindingRegistry,
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,

    pub directory: ChannelDirectory,
    /// Markers for the current page load have arrived.
    pub directory_loaded: bool,
    pub selected_channel: usize,
    /// Channel the current page load is for. `None` means the index page.
    pub page_channel: Option<ChannelId>,
    pub lifecycle: Lifecycle,
    pub focus: Focus,

    pub view: ViewState,
    pub stream: StreamController,
    pub debouncer: FilterDebouncer,
    pub sentinel: ScrollSentinel,
    pub filter_input: String,

    pub scroll_offset: usize,
    /// Visible lines of the content panel, from the last render.
    pub viewport_height: usize,
    pub rendered: RenderedContent,

    pub link: Option<Link>,
    /// Id of the most recent connect attempt; older results are dropped.
    pub link_attempt: u64,
    pub connect_handle: Option<JoinHandle<()>>,
    pub directory_handle: Option<JoinHandle<()>>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,
    /// When set, input goes to the confirmation overlay.
    pub pending_confirm: Option<ConfirmAction>,
    /// When set, input goes to the add-channel form.
    pub add_form: Option<ChannelForm>,
}

impl App {
    pub fn new(
        config: Config,
        endpoints: Endpoints,
        keybindings: KeybindingRegistry,
    ) -> Result<Self> {
        let http_client = http::build_client(&config)?;

        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        Ok(Self {
            http_client,
            page_channel: endpoints.channel(),
            endpoints,
            keybindings,
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            directory: ChannelDirectory::default(),
            directory_loaded: false,
            selected_channel: 0,
            lifecycle: Lifecycle::AwaitingConnection,
            focus: Focus::Content,
            view: ViewState::new(),
            stream: StreamController::new(),
            debouncer: FilterDebouncer::new(config.filter_quiet()),
            sentinel: ScrollSentinel::new(config.scroll_threshold_lines),
            filter_input: String::new(),
            scroll_offset: 0,
            viewport_height: 0,
            rendered: RenderedContent::default(),
            link: None,
            link_attempt: 0,
            connect_handle: None,
            directory_handle: None,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            pending_confirm: None,
            add_form: None,
            config,
        })
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
    }

    /// Cycle to the next theme variant. Returns the new theme's name.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------------
    // Channel list
    // ------------------------------------------------------------------------

    pub fn selected_entry(&self) -> Option<&ChannelEntry> {
        self.directory.entries().get(self.selected_channel)
    }

    /// Channel currently streaming, if any.
    pub fn active_channel(&self) -> Option<ChannelId> {
        match self.lifecycle {
            Lifecycle::Streaming => self.stream.channel(),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.lifecycle == Lifecycle::Streaming
    }

    pub fn nav_up(&mut self) {
        self.selected_channel = self.selected_channel.saturating_sub(1);
    }

    pub fn nav_down(&mut self) {
        if !self.directory.is_empty() {
            let max_index = self.directory.len().saturating_sub(1);
            self.selected_channel = self.selected_channel.saturating_add(1).min(max_index);
        }
    }

    pub fn clamp_selection(&mut self) {
        self.selected_channel = self
            .selected_channel
            .min(self.directory.len().saturating_sub(1));
    }

    // ------------------------------------------------------------------------
    // Page loads
    // ------------------------------------------------------------------------

    /// Reset per-page state and wait for activation of `channel`.
    fn begin_page_load(&mut self, channel: Option<ChannelId>) {
        self.page_channel = channel;
        self.lifecycle = Lifecycle::AwaitingConnection;
        self.stream.halt();
        self.view.clear();
        self.filter_input.clear();
        self.debouncer.cancel();
        self.scroll_offset = 0;
        self.pending_confirm = None;
        if self.focus == Focus::Filter {
            self.focus = Focus::Content;
        }
        self.needs_redraw = true;
    }

    /// Open the channel under the sidebar cursor as a new page load.
    pub fn select_channel(&mut self, now: Instant) {
        let Some(id) = self.selected_entry().map(|e| e.id) else {
            return;
        };
        tracing::info!(channel = %id, "Switching channel");
        self.begin_page_load(Some(id));
        self.focus = Focus::Content;
        self.try_activate(now);
    }

    /// Start the page load over: fresh markers and a fresh connection.
    ///
    /// The caller spawns the directory load and the connect task.
    pub fn reload(&mut self) {
        let channel = self.page_channel;
        tracing::info!(channel = ?channel, "Reloading page");
        self.drop_link();
        self.directory_loaded = false;
        self.begin_page_load(channel);
    }

    /// A connect attempt is needed and none is running.
    pub fn needs_connection(&self) -> bool {
        self.link.is_none()
            && self
                .connect_handle
                .as_ref()
                .is_none_or(JoinHandle::is_finished)
            && matches!(self.lifecycle, Lifecycle::AwaitingConnection)
    }

    /// Register a new connect attempt, superseding any earlier one.
    pub fn begin_connect(&mut self) -> u64 {
        if let Some(handle) = self.connect_handle.take() {
            handle.abort();
        }
        self.drop_link();
        self.link_attempt = self.link_attempt.wrapping_add(1);
        self.link_attempt
    }

    fn drop_link(&mut self) {
        if let Some(link) = self.link.take() {
            tracing::debug!(link = link.id(), "Dropping link");
        }
        self.stream.reset_link();
    }

    pub fn on_connected(&mut self, link: Link, now: Instant) {
        if link.id() != self.link_attempt {
            tracing::debug!(
                link = link.id(),
                current = self.link_attempt,
                "Ignoring superseded link"
            );
            return;
        }
        tracing::info!(link = link.id(), "Connected");
        self.connect_handle = None;
        self.stream.reset_link();
        self.link = Some(link);
        if matches!(self.lifecycle, Lifecycle::Disconnected { .. }) {
            self.lifecycle = Lifecycle::AwaitingConnection;
        }
        self.try_activate(now);
    }

    pub fn on_connect_failed(&mut self, attempt: u64, error: GateError) {
        if attempt != self.link_attempt {
            return;
        }
        tracing::error!(error = %error, "Could not connect to channel server");
        self.connect_handle = None;
        self.set_status(format!("Could not connect: {} (r to retry)", error));
        if !matches!(self.lifecycle, Lifecycle::Broken(_)) {
            self.lifecycle = Lifecycle::Disconnected {
                reason: error.to_string(),
            };
        }
    }

    pub fn on_directory_loaded(&mut self, result: Result<ChannelDirectory, String>, now: Instant) {
        self.directory_handle = None;
        match result {
            Ok(directory) => {
                tracing::debug!(channels = directory.len(), "Channel list loaded");
                self.directory = directory;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load channel list");
                self.set_status(format!("Failed to load channel list: {}", e));
            }
        }
        self.directory_loaded = true;
        self.clamp_selection();
        self.try_activate(now);
    }

    /// Activate the page channel once both the link and the markers are in.
    fn try_activate(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::AwaitingConnection
            || self.link.is_none()
            || !self.directory_loaded
        {
            return;
        }

        let channel = self
            .page_channel
            .or_else(|| self.directory.entries().first().map(|e| e.id));
        match channel {
            Some(channel) => self.activate_channel(channel, now),
            None => {
                tracing::info!("Server lists no channels");
                self.stream.halt();
                self.lifecycle = Lifecycle::NoChannel;
            }
        }
    }

    /// Decide between streaming and the broken fallback for `channel`.
    ///
    /// Health comes from the page markers only. A broken channel never
    /// sends a request.
    pub fn activate_channel(&mut self, channel: ChannelId, now: Instant) {
        self.page_channel = Some(channel);
        if let Some(idx) = self.directory.position(channel) {
            self.selected_channel = idx;
        }
        self.needs_redraw = true;

        match self.directory.activate(channel) {
            Activation::Fallback(fallback) => {
                tracing::info!(channel = %channel, "Channel is broken, showing fallback");
                self.stream.halt();
                self.view.clear();
                self.lifecycle = Lifecycle::Broken(fallback);
            }
            Activation::Streaming(channel) => {
                self.filter_input.clear();
                self.debouncer.cancel();
                self.scroll_offset = 0;
                let request = self.stream.begin(channel, &mut self.view, String::new(), now);
                self.lifecycle = Lifecycle::Streaming;
                self.send_request(request);
            }
        }
    }

    /// Hand a freshly issued request to the link. A refused request is
    /// withdrawn from the stream.
    fn send_request(&mut self, request: FetchRequest) {
        let Some(link) = &self.link else {
            tracing::warn!(channel = %request.channel_id, "No link for request");
            self.stream.withdraw_last();
            return;
        };
        if let Err(e) = link.send(request) {
            tracing::error!(error = %e, "Failed to queue request");
            self.stream.withdraw_last();
            self.set_status(format!("Request not sent: {}", e));
        }
    }

    // ------------------------------------------------------------------------
    // Transport events
    // ------------------------------------------------------------------------

    pub fn on_frame(&mut self, link: u64, payload: &[u8]) {
        if self.link.as_ref().map(Link::id) != Some(link) {
            tracing::debug!(link, "Frame from a dropped link");
            return;
        }

        match self.stream.on_response(&mut self.view, payload) {
            Ok(ResponseOutcome::Appended { count, offset }) => {
                tracing::debug!(count, offset, "Items appended");
                self.needs_redraw = true;
            }
            Ok(ResponseOutcome::Exhausted { offset }) => {
                tracing::debug!(offset, "Channel exhausted");
                if offset > 0 {
                    self.set_status("No more items");
                }
                self.needs_redraw = true;
            }
            Ok(ResponseOutcome::Stale { .. }) => {}
            Err(e @ StreamError::Malformed { .. }) => {
                tracing::error!(error = %e, "Bad response from server");
                self.set_status(format!("Bad response: {}", e));
            }
            Err(StreamError::Unsolicited) => {
                tracing::warn!(bytes = payload.len(), "Unsolicited frame discarded");
            }
        }
    }

    pub fn on_disconnected(&mut self, link: u64, reason: String) {
        if self.link.as_ref().map(Link::id) != Some(link) {
            return;
        }
        tracing::warn!(link, reason = %reason, "Link lost");
        self.drop_link();
        self.set_status(format!("Connection lost: {} (r to reload)", reason));
        if !matches!(self.lifecycle, Lifecycle::Broken(_)) {
            self.lifecycle = Lifecycle::Disconnected { reason };
        }
    }

    /// Abandon requests that got no reply in time, so paging can resume.
    pub fn expire_overdue(&mut self, now: Instant) {
        let Some(timeout) = self.config.response_timeout() else {
            return;
        };
        let expired = self.stream.expire(now, timeout);
        if expired > 0 {
            tracing::warn!(expired, timeout_secs = timeout.as_secs(), "Requests timed out");
            self.set_status(format!("No reply after {}s", timeout.as_secs()));
            self.needs_redraw = true;
        }
    }

    // ------------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------------

    pub fn filter_push(&mut self, c: char, now: Instant) {
        if self.filter_input.len() >= MAX_FILTER_LENGTH {
            self.set_status(format!("Filter at max length ({} chars)", MAX_FILTER_LENGTH));
            return;
        }
        self.filter_input.push(c);
        self.debouncer.on_change(self.filter_input.clone(), now);
    }

    pub fn filter_pop(&mut self, now: Instant) {
        if self.filter_input.pop().is_some() {
            self.debouncer.on_change(self.filter_input.clone(), now);
        }
    }

    pub fn clear_filter(&mut self, now: Instant) {
        if !self.filter_input.is_empty() || !self.stream.filter().is_empty() {
            self.filter_input.clear();
            self.debouncer.on_change(String::new(), now);
        }
    }

    /// Apply the typed filter right away instead of waiting for the quiet
    /// interval.
    pub fn commit_filter(&mut self, now: Instant) {
        self.debouncer.cancel();
        self.focus = Focus::Content;
        if self.filter_input != self.stream.filter() {
            self.apply_filter(self.filter_input.clone(), now);
        }
    }

    /// Refresh with the debounced filter value once it is due.
    pub fn fire_debounced(&mut self, now: Instant) {
        if let Some(value) = self.debouncer.fire(now) {
            self.apply_filter(value, now);
        }
    }

    fn apply_filter(&mut self, value: String, now: Instant) {
        if !self.is_streaming() {
            // Show the filter the items on screen were fetched with.
            tracing::debug!(filter = %value, "Filter not applied, channel is not streaming");
            self.filter_input = self.stream.filter().to_string();
            if self.focus == Focus::Filter {
                self.focus = Focus::Content;
            }
            self.set_status("Filter not applied: channel is not streaming");
            self.needs_redraw = true;
            return;
        }
        if let Some(request) = self.stream.refresh(&mut self.view, value, now) {
            self.scroll_offset = 0;
            self.needs_redraw = true;
            self.send_request(request);
        }
    }

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    pub fn content_height(&self) -> usize {
        self.rendered.line_count()
    }

    fn max_scroll(&self) -> usize {
        self.content_height().saturating_sub(self.viewport_height)
    }

    pub fn scroll_down(&mut self, lines: usize, now: Instant) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll());
        self.check_bottom(now);
    }

    pub fn scroll_up(&mut self, lines: usize, now: Instant) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.check_bottom(now);
    }

    pub fn scroll_to_top(&mut self, now: Instant) {
        self.scroll_offset = 0;
        self.check_bottom(now);
    }

    pub fn scroll_to_bottom(&mut self, now: Instant) {
        self.scroll_offset = self.max_scroll();
        self.check_bottom(now);
    }

    pub fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    /// Ask for the next page when the content panel is at its end.
    pub fn check_bottom(&mut self, now: Instant) {
        if !self.is_streaming() {
            return;
        }
        let at_bottom = self.sentinel.reached_bottom(
            self.scroll_offset,
            self.viewport_height,
            self.content_height(),
        );
        if !at_bottom {
            return;
        }
        if let Some(request) = self.stream.fetch_next(&self.view, now) {
            tracing::debug!(offset = request.offset, "Bottom reached, fetching next page");
            self.send_request(request);
        }
    }

    /// Item at the top of the content panel.
    pub fn item_in_view(&self) -> Option<&FeedItem> {
        self.rendered
            .item_at(self.scroll_offset)
            .and_then(|idx| self.view.items().get(idx))
    }

    // ------------------------------------------------------------------------
    // Broken channel: delete action
    // ------------------------------------------------------------------------

    /// Ask for confirmation before deleting the broken channel.
    pub fn request_delete(&mut self) {
        let Lifecycle::Broken(fallback) = &self.lifecycle else {
            return;
        };
        let channel = fallback.channel;
        let name = self
            .directory
            .get(channel)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| format!("Channel {}", channel));
        self.pending_confirm = Some(ConfirmAction::DeleteChannel { channel, name });
    }

    /// After a delete the server sends the browser to the index page.
    ///
    /// The caller spawns the directory load for the index.
    pub fn on_channel_deleted(&mut self, channel: ChannelId) {
        let name = self
            .directory
            .remove(channel)
            .map(|e| e.name)
            .unwrap_or_else(|| format!("Channel {}", channel));
        self.set_status(format!("Deleted {}", name));
        self.directory_loaded = false;
        self.begin_page_load(None);
        self.clamp_selection();
    }

    pub fn on_channel_delete_failed(&mut self, channel: ChannelId, error: &str) {
        tracing::error!(channel = %channel, error = %error, "Delete failed");
        self.set_status(format!("Delete failed: {}", error));
    }

    // ------------------------------------------------------------------------
    // Add channel
    // ------------------------------------------------------------------------

    pub fn open_add_form(&mut self) {
        self.add_form = Some(ChannelForm::new());
        self.needs_redraw = true;
    }

    /// The server registered the channel. The caller reloads the markers so
    /// it shows up in the channel list.
    pub fn on_channel_added(&mut self, name: &str) {
        self.set_status(format!("Added {}", name));
    }

    pub fn on_channel_add_failed(&mut self, name: &str, error: &str) {
        tracing::error!(name = %name, error = %error, "Add channel failed");
        self.set_status(format!("Could not add {}: {}", name, error));
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort in-flight background tasks on drop. The link aborts its own tasks.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.connect_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.directory_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelEntry, ChannelHealth};
    use tokio::sync::mpsc;
    use tokio::time::{self, Duration};

    fn id(raw: u32) -> ChannelId {
        ChannelId::new(raw).unwrap()
    }

    fn test_app() -> App {
        let endpoints = Endpoints::from_page_url("http://localhost:8080/channels/5").unwrap();
        App::new(Config::default(), endpoints, KeybindingRegistry::new()).unwrap()
    }

    fn directory(entries: &[(u32, &str, ChannelHealth)]) -> ChannelDirectory {
        ChannelDirectory::from_entries(
            entries
                .iter()
                .map(|(raw, name, health)| ChannelEntry {
                    id: id(*raw),
                    name: name.to_string(),
                    health: *health,
                })
                .collect(),
        )
    }

    fn connect(app: &mut App) -> mpsc::Receiver<FetchRequest> {
        let (tx, rx) = mpsc::channel(16);
        let attempt = app.begin_connect();
        app.on_connected(Link::detached(attempt, tx), Instant::now());
        rx
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = test_app();
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_waits_for_both_link_and_markers() {
        let mut app = test_app();
        let mut rx = connect(&mut app);
        assert_eq!(app.lifecycle, Lifecycle::AwaitingConnection);
        assert!(rx.try_recv().is_err());

        app.on_directory_loaded(
            Ok(directory(&[(5, "Five", ChannelHealth::Healthy)])),
            Instant::now(),
        );
        assert_eq!(app.lifecycle, Lifecycle::Streaming);
        assert_eq!(app.active_channel(), Some(id(5)));
        let request = rx.try_recv().unwrap();
        assert_eq!(request.offset, 0);
        assert_eq!(request.filter, "");
    }

    #[tokio::test]
    async fn test_index_page_picks_first_channel() {
        let endpoints = Endpoints::from_page_url("http://localhost:8080/").unwrap();
        let mut app = App::new(Config::default(), endpoints, KeybindingRegistry::new()).unwrap();
        app.on_directory_loaded(
            Ok(directory(&[
                (3, "Three", ChannelHealth::Healthy),
                (4, "Four", ChannelHealth::Healthy),
            ])),
            Instant::now(),
        );
        let mut rx = connect(&mut app);
        assert_eq!(rx.try_recv().unwrap().channel_id, id(3));
        assert_eq!(app.selected_channel, 0);
    }

    #[tokio::test]
    async fn test_empty_directory_is_no_channel() {
        let endpoints = Endpoints::from_page_url("http://localhost:8080/").unwrap();
        let mut app = App::new(Config::default(), endpoints, KeybindingRegistry::new()).unwrap();
        app.on_directory_loaded(Ok(ChannelDirectory::default()), Instant::now());
        let mut rx = connect(&mut app);
        assert_eq!(app.lifecycle, Lifecycle::NoChannel);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_superseded_link_is_ignored() {
        let mut app = test_app();
        app.on_directory_loaded(Ok(ChannelDirectory::default()), Instant::now());
        let (tx, mut rx) = mpsc::channel(4);
        let stale = app.begin_connect();
        app.begin_connect();
        app.on_connected(Link::detached(stale, tx), Instant::now());
        assert!(app.link.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_keeps_items_and_drops_link() {
        let mut app = test_app();
        app.on_directory_loaded(Ok(ChannelDirectory::default()), Instant::now());
        let _rx = connect(&mut app);
        let link = app.link.as_ref().unwrap().id();
        app.on_frame(link, br#"[{"Title":"a","Link":"l","Description":"d"}]"#);
        assert_eq!(app.view.len(), 1);

        app.on_disconnected(link, "reset by peer".into());
        assert!(app.link.is_none());
        assert_eq!(app.view.len(), 1);
        assert!(matches!(app.lifecycle, Lifecycle::Disconnected { .. }));

        // Late frames from the dead link change nothing.
        app.on_frame(link, br#"[{"Title":"b","Link":"l","Description":"d"}]"#);
        assert_eq!(app.view.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_due_after_disconnect_is_not_left_on_screen() {
        let mut app = test_app();
        app.on_directory_loaded(Ok(ChannelDirectory::default()), Instant::now());
        let mut rx = connect(&mut app);
        let _ = rx.try_recv();
        let link = app.link.as_ref().unwrap().id();

        app.focus = Focus::Filter;
        app.filter_push('a', Instant::now());
        app.filter_push('b', Instant::now());
        app.on_disconnected(link, "reset by peer".into());

        time::advance(Duration::from_millis(150)).await;
        app.fire_debounced(Instant::now());

        assert!(!app.debouncer.is_pending());
        assert_eq!(app.filter_input, "");
        assert_eq!(app.stream.filter(), "");
        assert_eq!(app.focus, Focus::Content);
        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert_eq!(
            status.as_deref(),
            Some("Filter not applied: channel is not streaming")
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broken_channel_delete_flow() {
        let mut app = test_app();
        app.on_directory_loaded(
            Ok(directory(&[
                (5, "Five", ChannelHealth::Broken),
                (6, "Six", ChannelHealth::Healthy),
            ])),
            Instant::now(),
        );
        let _rx = connect(&mut app);
        assert!(matches!(app.lifecycle, Lifecycle::Broken(_)));

        app.request_delete();
        assert_eq!(
            app.pending_confirm,
            Some(ConfirmAction::DeleteChannel {
                channel: id(5),
                name: "Five".into()
            })
        );

        app.pending_confirm = None;
        app.on_channel_deleted(id(5));
        assert_eq!(app.directory.len(), 1);
        assert_eq!(app.page_channel, None);
        assert!(!app.directory_loaded);
        assert_eq!(app.lifecycle, Lifecycle::AwaitingConnection);
    }

    #[tokio::test]
    async fn test_request_delete_only_when_broken() {
        let mut app = test_app();
        app.on_directory_loaded(Ok(ChannelDirectory::default()), Instant::now());
        let _rx = connect(&mut app);
        app.request_delete();
        assert!(app.pending_confirm.is_none());
    }

    #[tokio::test]
    async fn test_select_channel_switches_stream() {
        let mut app = test_app();
        app.on_directory_loaded(
            Ok(directory(&[
                (5, "Five", ChannelHealth::Healthy),
                (6, "Six", ChannelHealth::Healthy),
            ])),
            Instant::now(),
        );
        let mut rx = connect(&mut app);
        let _ = rx.try_recv();
        app.filter_input = "old".into();

        app.nav_down();
        app.select_channel(Instant::now());
        let request = rx.try_recv().unwrap();
        assert_eq!(request.channel_id, id(6));
        assert_eq!(request.offset, 0);
        assert!(app.filter_input.is_empty());
        assert_eq!(app.active_channel(), Some(id(6)));
    }

    #[tokio::test]
    async fn test_nav_clamps() {
        let mut app = test_app();
        app.nav_up();
        app.nav_down();
        assert_eq!(app.selected_channel, 0);
        app.directory = directory(&[
            (1, "a", ChannelHealth::Healthy),
            (2, "b", ChannelHealth::Healthy),
        ]);
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected_channel, 1);
    }

    #[tokio::test]
    async fn test_cycle_theme_round_trip() {
        let mut app = test_app();
        assert_eq!(app.theme_variant, ThemeVariant::Dark);
        assert_eq!(app.cycle_theme(), "Light");
        assert_eq!(app.style("item_heading"), ThemeVariant::Light.palette().item_heading);
        assert_eq!(app.cycle_theme(), "Dark");
    }

    #[test]
    fn test_item_at_line() {
        let rendered = RenderedContent {
            item_starts: vec![0, 4, 9],
            ..Default::default()
        };
        assert_eq!(rendered.item_at(0), Some(0));
        assert_eq!(rendered.item_at(3), Some(0));
        assert_eq!(rendered.item_at(4), Some(1));
        assert_eq!(rendered.item_at(20), Some(2));
        assert_eq!(RenderedContent::default().item_at(0), None);
    }
}
