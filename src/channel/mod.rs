//! Channel streaming core: everything that decides what to fetch and what to
//! show, independent of the terminal and the socket.
//!
//! - [`gate`] - wait for the duplex connection before sending anything
//! - [`health`] - channel markers from the server page, broken-channel fallback
//! - [`form`] - registration form for a new channel
//! - [`debounce`] - coalesce filter keystrokes into one refresh
//! - [`cursor`] - offset of the next page
//! - [`stream`] - request/response sequencing and stale-reply rejection
//! - [`view`] - items on screen and their rendered fragments
//! - [`sentinel`] - bottom-of-scroll detection
//!
//! # Example
//!
//! ```
//! use chanview::channel::{ChannelId, StreamController, ViewState};
//! use tokio::time::Instant;
//!
//! let mut view = ViewState::new();
//! let mut stream = StreamController::new();
//! let channel = ChannelId::new(5).unwrap();
//!
//! let request = stream.begin(channel, &mut view, String::new(), Instant::now());
//! assert_eq!(request.offset, 0);
//!
//! let payload = br#"[{"Title":"T1","Link":"http://x","Description":"D1"}]"#;
//! stream.on_response(&mut view, payload).unwrap();
//! assert_eq!(view.cursor().offset(), 1);
//! ```

pub mod cursor;
pub mod debounce;
pub mod form;
pub mod gate;
pub mod health;
pub mod protocol;
pub mod sentinel;
pub mod stream;
pub mod types;
pub mod view;

pub use cursor::PaginationCursor;
pub use debounce::{FilterDebouncer, DEFAULT_FILTER_QUIET};
pub use form::{ChannelForm, FormError, NewChannel, FIELDS};
pub use gate::{await_ready, GateError, ReadyPolicy};
pub use health::{
    Activation, BrokenChannelView, ChannelDirectory, ChannelEntry, ChannelHealth,
};
pub use protocol::{decode_items, encode_request, ProtocolError, MAX_FRAME_SIZE};
pub use sentinel::ScrollSentinel;
pub use stream::{FetchMode, ResponseOutcome, StreamController, StreamError};
pub use types::{ChannelId, ChannelIdError, FeedItem, FetchRequest};
pub use view::{ViewNode, ViewRenderer, ViewState, NODES_PER_ITEM};
