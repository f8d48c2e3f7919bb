use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while extracting a channel id from a path or string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelIdError {
    /// The input contained no decimal digits at all.
    #[error("No channel id found in '{0}'")]
    Missing(String),
    /// The digits did not form a positive 32-bit integer.
    #[error("Invalid channel id '{0}': must be a positive integer")]
    Invalid(String),
}

/// Identifier of a channel on the server.
///
/// Always positive. Serialized as a bare integer, matching the `Id` field of
/// the fetch protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ChannelId(u32);

impl ChannelId {
    /// Wrap a raw id, rejecting zero.
    pub fn new(raw: u32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Extract the id from a page path by taking the first run of digits.
    ///
    /// `/channels/5` and `/channels/5/` both yield 5. Trailing segments are
    /// ignored once the first digit run ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanview::channel::ChannelId;
    ///
    /// let id = ChannelId::from_path("/channels/42").unwrap();
    /// assert_eq!(id.get(), 42);
    /// assert!(ChannelId::from_path("/channels/").is_err());
    /// ```
    pub fn from_path(path: &str) -> Result<Self, ChannelIdError> {
        let start = path
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ChannelIdError::Missing(path.to_string()))?;
        let digits: &str = {
            let rest = &path[start..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };
        digits.parse()
    }
}

impl FromStr for ChannelId {
    type Err = ChannelIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s
            .trim()
            .parse()
            .map_err(|_| ChannelIdError::Invalid(s.to_string()))?;
        Self::new(raw).ok_or_else(|| ChannelIdError::Invalid(s.to_string()))
    }
}

impl TryFrom<u32> for ChannelId {
    type Error = ChannelIdError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| ChannelIdError::Invalid(raw.to_string()))
    }
}

impl From<ChannelId> for u32 {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One item of a channel as sent by the server.
///
/// `title` and `description` may carry markup. Extra fields the server
/// attaches (database ids, timestamps) are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Outbound request for one page of a channel.
///
/// `offset` is the number of items already rendered for the current
/// channel and filter, never a byte or record index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FetchRequest {
    #[serde(rename = "Id")]
    pub channel_id: ChannelId,
    pub offset: u64,
    pub filter: String,
}
