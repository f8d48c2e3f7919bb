//! Request/response sequencing over the channel socket.
//!
//! The server answers the requests of one connection strictly in the order
//! it received them, and its replies carry no request id. Every sent request
//! is therefore queued as a ticket, and each inbound frame is paired with
//! the oldest ticket. Tickets remember the refresh generation they were
//! issued under; a reply whose ticket belongs to an older generation (the
//! filter or channel changed since) is discarded instead of being appended
//! at the wrong offset.

use super::protocol::{decode_items, ProtocolError};
use super::types::{ChannelId, FetchRequest};
use super::view::ViewState;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum StreamError {
    /// The reply could not be decoded. Its ticket is consumed.
    #[error("Bad response for offset {offset}: {source}")]
    Malformed {
        offset: u64,
        #[source]
        source: ProtocolError,
    },
    /// A frame arrived while no request was outstanding.
    #[error("Unsolicited frame from server")]
    Unsolicited,
}

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Full refresh from offset 0 after clearing the view.
    Refresh,
    /// Next page appended to the current view.
    Append,
}

/// Result of applying one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Items were appended; `offset` is the cursor after the append.
    Appended { count: usize, offset: u64 },
    /// Empty page: nothing more for this channel and filter.
    Exhausted { offset: u64 },
    /// Reply to a superseded or abandoned request, dropped.
    Stale { offset: u64 },
}

#[derive(Debug)]
struct Ticket {
    generation: u64,
    offset: u64,
    mode: FetchMode,
    sent_at: Instant,
    abandoned: bool,
}

/// Owns the fetch lifecycle for the current channel.
#[derive(Debug, Default)]
pub struct StreamController {
    channel: Option<ChannelId>,
    filter: String,
    generation: u64,
    pending: VecDeque<Ticket>,
    exhausted: bool,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel being streamed, `None` when halted.
    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    /// Filter the current generation was started with.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the server reported the end of the current listing.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Requests sent and not yet answered, live or not.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Whether a live request of the current generation is awaiting a reply.
    pub fn in_flight(&self) -> bool {
        self.pending
            .iter()
            .any(|t| t.generation == self.generation && !t.abandoned)
    }

    /// Start streaming `channel` from scratch with `filter`.
    ///
    /// Clears the view, supersedes everything in flight and returns the
    /// request for offset 0.
    pub fn begin(
        &mut self,
        channel: ChannelId,
        view: &mut ViewState,
        filter: String,
        now: Instant,
    ) -> FetchRequest {
        self.channel = Some(channel);
        self.filter = filter;
        self.generation = self.generation.wrapping_add(1);
        self.exhausted = false;
        view.clear();

        tracing::debug!(
            channel = %channel,
            filter = %self.filter,
            generation = self.generation,
            "Starting refresh"
        );
        self.issue(channel, view, FetchMode::Refresh, now)
    }

    /// Refresh the current channel with a new filter.
    pub fn refresh(
        &mut self,
        view: &mut ViewState,
        filter: String,
        now: Instant,
    ) -> Option<FetchRequest> {
        let channel = self.channel?;
        Some(self.begin(channel, view, filter, now))
    }

    /// Request the page after what is currently rendered.
    ///
    /// Returns `None` while halted, while a page for the current generation
    /// is still in flight, or after the server reported the end.
    pub fn fetch_next(&mut self, view: &ViewState, now: Instant) -> Option<FetchRequest> {
        let channel = self.channel?;
        if self.exhausted {
            tracing::trace!("Channel exhausted, not fetching");
            return None;
        }
        if self.in_flight() {
            tracing::trace!(generation = self.generation, "Fetch already in flight");
            return None;
        }
        Some(self.issue(channel, view, FetchMode::Append, now))
    }

    fn issue(
        &mut self,
        channel: ChannelId,
        view: &ViewState,
        mode: FetchMode,
        now: Instant,
    ) -> FetchRequest {
        let offset = view.cursor().offset();
        self.pending.push_back(Ticket {
            generation: self.generation,
            offset,
            mode,
            sent_at: now,
            abandoned: false,
        });
        FetchRequest {
            channel_id: channel,
            offset,
            filter: self.filter.clone(),
        }
    }

    /// Take back the ticket of the request just issued.
    ///
    /// Only valid right after `begin`, `refresh` or `fetch_next` returned a
    /// request that the link then refused. No reply will come for it.
    pub fn withdraw_last(&mut self) {
        if let Some(ticket) = self.pending.pop_back() {
            tracing::debug!(
                offset = ticket.offset,
                generation = ticket.generation,
                mode = ?ticket.mode,
                "Withdrew unsent request"
            );
        }
    }

    /// Pair an inbound frame with the oldest outstanding request and apply it.
    pub fn on_response(
        &mut self,
        view: &mut ViewState,
        payload: &[u8],
    ) -> Result<ResponseOutcome, StreamError> {
        let ticket = self.pending.pop_front().ok_or(StreamError::Unsolicited)?;

        if ticket.generation != self.generation || ticket.abandoned || self.channel.is_none() {
            tracing::debug!(
                offset = ticket.offset,
                ticket_generation = ticket.generation,
                generation = self.generation,
                abandoned = ticket.abandoned,
                "Discarding stale response"
            );
            return Ok(ResponseOutcome::Stale {
                offset: ticket.offset,
            });
        }

        let items = decode_items(payload).map_err(|source| StreamError::Malformed {
            offset: ticket.offset,
            source,
        })?;

        if ticket.offset != view.cursor().offset() {
            // Cannot happen while at most one live ticket exists per
            // generation; keep the view consistent if it ever does.
            tracing::warn!(
                expected = ticket.offset,
                actual = view.cursor().offset(),
                "Response offset does not match cursor, dropping"
            );
            return Ok(ResponseOutcome::Stale {
                offset: ticket.offset,
            });
        }

        if items.is_empty() {
            self.exhausted = true;
            tracing::debug!(offset = ticket.offset, mode = ?ticket.mode, "Channel exhausted");
            return Ok(ResponseOutcome::Exhausted {
                offset: ticket.offset,
            });
        }

        let count = items.len();
        view.append(items);
        tracing::debug!(
            count,
            offset = view.cursor().offset(),
            mode = ?ticket.mode,
            "Appended items"
        );
        Ok(ResponseOutcome::Appended {
            count,
            offset: view.cursor().offset(),
        })
    }

    /// Abandon live requests older than `timeout`.
    ///
    /// Abandoned tickets stay queued so that a late reply is still paired
    /// with them (and dropped). Returns how many were abandoned.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> usize {
        let mut expired = 0;
        for ticket in self.pending.iter_mut().filter(|t| !t.abandoned) {
            if now.saturating_duration_since(ticket.sent_at) >= timeout {
                ticket.abandoned = true;
                expired += 1;
            }
        }
        if expired > 0 {
            tracing::warn!(expired, ?timeout, "Abandoned overdue requests");
        }
        expired
    }

    /// Stop streaming entirely. Replies still in flight will be dropped.
    pub fn halt(&mut self) {
        self.channel = None;
        self.filter.clear();
        self.generation = self.generation.wrapping_add(1);
        self.exhausted = false;
    }

    /// Forget every outstanding request; used when the connection is replaced.
    pub fn reset_link(&mut self) {
        self.pending.clear();
    }
}
