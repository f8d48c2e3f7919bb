//! Connection plumbing between the session and the channel server.
//!
//! - [`Endpoints`] derives every server URL (pages, socket, delete action)
//!   from the page URL given on the command line
//! - [`connect`] performs one WebSocket handshake; retries are the
//!   gate's job, see [`crate::channel::await_ready`]
//! - [`spawn_link`] splits an open socket into a reader and a writer task
//!   that talk to the event loop over `mpsc` channels
//! - [`http`] fetches page markers and runs the add and delete actions

pub mod http;

use crate::app::AppEvent;
use crate::channel::{encode_request, form, health, ChannelId, FetchRequest};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite, tungstenite::Message as WsMessage, MaybeTlsStream,
    WebSocketStream,
};
use url::Url;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Path of the channel socket on the server.
pub const SOCKET_PATH: &str = "/ws";

/// Queue depth between the session and the writer task.
const OUTBOUND_CAPACITY: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Server URL has no host")]
    NoHost,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),
    #[error("Outbound queue is full")]
    Backlogged,
    #[error("Connection is closed")]
    Closed,
}

/// Server URLs derived from one page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    page: Url,
    socket: Url,
}

impl Endpoints {
    /// Parse a server or channel page URL such as `http://host:8080/channels/5`.
    ///
    /// A bare host without a scheme is taken as `http://`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanview::transport::Endpoints;
    ///
    /// let endpoints = Endpoints::from_page_url("https://example.com/channels/5").unwrap();
    /// assert_eq!(endpoints.ws_url().as_str(), "wss://example.com/ws");
    /// assert_eq!(endpoints.channel().map(|c| c.get()), Some(5));
    /// ```
    pub fn from_page_url(raw: &str) -> Result<Self, EndpointError> {
        let raw = raw.trim();
        let page = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}"))?,
            Err(e) => return Err(e.into()),
        };

        let socket_scheme = match page.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(EndpointError::UnsupportedScheme(other.to_owned())),
        };
        if page.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::NoHost);
        }

        let mut socket = page.clone();
        socket
            .set_scheme(socket_scheme)
            .map_err(|()| EndpointError::UnsupportedScheme(page.scheme().to_owned()))?;
        socket.set_path(SOCKET_PATH);
        socket.set_query(None);
        socket.set_fragment(None);

        Ok(Self { page, socket })
    }

    pub fn page_url(&self) -> &Url {
        &self.page
    }

    pub fn ws_url(&self) -> &Url {
        &self.socket
    }

    /// Page URL, used as the base for relative item links.
    pub fn base(&self) -> &Url {
        &self.page
    }

    /// Channel named by the page path, if any.
    pub fn channel(&self) -> Option<ChannelId> {
        ChannelId::from_path(self.page.path()).ok()
    }

    fn with_path(&self, path: &str) -> Url {
        let mut url = self.page.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub fn index_url(&self) -> Url {
        self.with_path("/")
    }

    pub fn channel_page(&self, channel: ChannelId) -> Url {
        self.with_path(&format!("/channels/{channel}"))
    }

    /// Page whose markers describe `channel`, or the index when none is set.
    pub fn page_for(&self, channel: Option<ChannelId>) -> Url {
        match channel {
            Some(channel) => self.channel_page(channel),
            None => self.index_url(),
        }
    }

    pub fn delete_url(&self, channel: ChannelId) -> Url {
        self.with_path(&health::delete_path(channel))
    }

    pub fn add_channel_url(&self) -> Url {
        self.with_path(form::ADD_CHANNEL_PATH)
    }

    /// Same server, opened on the page of `channel`.
    pub fn for_channel(&self, channel: ChannelId) -> Self {
        Self {
            page: self.channel_page(channel),
            socket: self.socket.clone(),
        }
    }
}

/// One WebSocket handshake against `url`.
pub async fn connect(url: &Url) -> Result<WsStream, TransportError> {
    let (socket, response) = connect_async(url.as_str()).await?;
    tracing::debug!(url = %url, status = %response.status(), "WebSocket handshake complete");
    Ok(socket)
}

/// Session-side handle to an open connection.
///
/// Dropping the link aborts its reader and writer tasks, which closes the
/// socket.
pub struct Link {
    id: u64,
    outbound: mpsc::Sender<FetchRequest>,
    tasks: Vec<JoinHandle<()>>,
}

impl Link {
    /// A link without transport tasks; requests land on `outbound` as-is.
    pub fn detached(id: u64, outbound: mpsc::Sender<FetchRequest>) -> Self {
        Self {
            id,
            outbound,
            tasks: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue a request for the writer task without waiting.
    pub fn send(&self, request: FetchRequest) -> Result<(), TransportError> {
        self.outbound.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Backlogged,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Split `socket` into reader and writer tasks reporting to `event_tx`.
///
/// Every inbound text or binary frame becomes [`AppEvent::Frame`] in arrival
/// order. The first failure on either half reports [`AppEvent::Disconnected`].
pub fn spawn_link(socket: WsStream, id: u64, event_tx: mpsc::Sender<AppEvent>) -> Link {
    let (write_half, read_half) = socket.split();
    let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    let reader = spawn_reader(read_half, id, event_tx.clone());
    let writer = spawn_writer(write_half, outbound_rx, id, event_tx);

    Link {
        id,
        outbound,
        tasks: vec![reader, writer],
    }
}

fn spawn_reader(
    mut read_half: futures::stream::SplitStream<WsStream>,
    link: u64,
    event_tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = loop {
            let msg = match read_half.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => break e.to_string(),
                None => break "connection closed".to_string(),
            };

            let payload = match msg {
                WsMessage::Text(payload) => payload.as_str().as_bytes().to_vec(),
                WsMessage::Binary(payload) => payload.to_vec(),
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                WsMessage::Close(frame) => {
                    break frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                }
                _ => continue,
            };

            tracing::trace!(link, bytes = payload.len(), "Frame received");
            if event_tx.send(AppEvent::Frame { link, payload }).await.is_err() {
                // Session is gone; nothing left to report to.
                return;
            }
        };

        tracing::info!(link, reason = %reason, "Connection lost");
        let _ = event_tx.send(AppEvent::Disconnected { link, reason }).await;
    })
}

fn spawn_writer(
    mut write_half: futures::stream::SplitSink<WsStream, WsMessage>,
    mut outbound_rx: mpsc::Receiver<FetchRequest>,
    link: u64,
    event_tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = outbound_rx.recv().await {
            let payload = match encode_request(&request) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        channel = %request.channel_id,
                        "Failed to encode request"
                    );
                    continue;
                }
            };
            tracing::debug!(
                link,
                channel = %request.channel_id,
                offset = request.offset,
                filter = %request.filter,
                "Sending fetch request"
            );
            if let Err(e) = write_half.send(WsMessage::Text(payload.into())).await {
                let _ = event_tx
                    .send(AppEvent::Disconnected {
                        link,
                        reason: e.to_string(),
                    })
                    .await;
                return;
            }
        }
        let _ = write_half.close().await;
    })
}
