//! Wire codec for the channel socket.
//!
//! Outbound frames are single JSON objects (`FetchRequest`), inbound frames
//! are JSON arrays of `FeedItem`. An empty array is a valid reply meaning the
//! channel has no more items for the requested offset and filter.

use super::types::{FeedItem, FetchRequest};
use thiserror::Error;

/// Largest inbound frame we are willing to decode (4MB).
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    TooLarge(usize),
}

/// Serialize a request into the text payload sent over the socket.
pub fn encode_request(request: &FetchRequest) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(request)?)
}

/// Decode an inbound frame into items, preserving server order.
pub fn decode_items(payload: &[u8]) -> Result<Vec<FeedItem>, ProtocolError> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::TooLarge(payload.len()));
    }
    // A nil slice on the server marshals as `null`; treat it like `[]`.
    let items: Option<Vec<FeedItem>> = serde_json::from_slice(payload)?;
    Ok(items.unwrap_or_default())
}
