//! Plain HTTP calls to the channel server: page markers, channel
//! registration and deletion.

use crate::channel::{ChannelDirectory, NewChannel};
use crate::config::Config;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Largest page we read markers from (2MB).
const MAX_PAGE_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum HttpError {
    /// DNS, connection, TLS, timeout or redirect failure.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Page too large (max {MAX_PAGE_SIZE} bytes)")]
    TooLarge,
    #[error("Page is not valid UTF-8")]
    Encoding,
}

/// Redirect policy with loop detection and at most 3 hops.
///
/// The delete action answers with a redirect back to the index, so
/// redirects are followed but kept short.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}

/// HTTP client for page and delete requests.
pub fn build_client(config: &Config) -> Result<reqwest::Client, HttpError> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(config.page_timeout())
        .build()?;
    Ok(client)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, HttpError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(HttpError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(HttpError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Fetch a server page and read its channel markers.
pub async fn fetch_directory(
    client: &reqwest::Client,
    page: &Url,
) -> Result<ChannelDirectory, HttpError> {
    let response = client.get(page.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %page, status = %status, "Page request failed");
        return Err(HttpError::HttpStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_PAGE_SIZE).await?;
    let html = String::from_utf8(bytes).map_err(|_| HttpError::Encoding)?;
    Ok(ChannelDirectory::from_html(&html))
}

/// Follow the delete action for a channel.
///
/// The server replies with a small page that sends the browser back to the
/// index; its body is not needed.
pub async fn delete_channel(client: &reqwest::Client, url: &Url) -> Result<(), HttpError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(HttpError::HttpStatus(status.as_u16()));
    }
    tracing::info!(url = %url, "Channel deleted");
    Ok(())
}

/// Register a new channel with the server's add action.
///
/// Like delete, the server answers with a page that sends the browser back
/// to the index.
pub async fn add_channel(
    client: &reqwest::Client,
    url: &Url,
    channel: &NewChannel,
) -> Result<(), HttpError> {
    let response = client
        .post(url.clone())
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(channel.form_body())
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = %status, "Add channel request failed");
        return Err(HttpError::HttpStatus(status.as_u16()));
    }
    tracing::info!(name = %channel.name, source = %channel.source, "Channel added");
    Ok(())
}
