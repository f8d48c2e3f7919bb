//! Registration of a new channel.
//!
//! The server scrapes a channel's source page with four patterns: one that
//! cuts the page into items and three that pick the link, title and
//! description out of each item. A new channel is registered by posting the
//! name, the source URL and those patterns as a urlencoded form.

use crate::util::{validate_link_for_open, UrlValidationError};
use thiserror::Error;

/// Server path that registers a channel.
pub const ADD_CHANNEL_PATH: &str = "/addchannel";

/// Longest value accepted in one form field.
pub const MAX_FIELD_LENGTH: usize = 2048;

/// One input of the form: label on screen and key in the posted body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub key: &'static str,
}

const fn field(label: &'static str, key: &'static str) -> FormField {
    FormField { label, key }
}

/// Inputs of the registration form, in the order they are shown.
pub const FIELDS: [FormField; 6] = [
    field("Name", "channel_name"),
    field("Source URL", "channel_source"),
    field("Item pattern", "item_pattern"),
    field("Link pattern", "link_pattern"),
    field("Title pattern", "title_pattern"),
    field("Description pattern", "description_pattern"),
];

const NAME: usize = 0;
const SOURCE: usize = 1;
const ITEM: usize = 2;
const LINK: usize = 3;
const TITLE: usize = 4;
const DESCRIPTION: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Source URL: {0}")]
    Source(#[from] UrlValidationError),
}

/// Validated registration, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    pub source: String,
    pub item_pattern: String,
    pub link_pattern: String,
    pub title_pattern: String,
    pub description_pattern: String,
}

impl NewChannel {
    /// `application/x-www-form-urlencoded` body for the add action.
    ///
    /// # Examples
    ///
    /// ```
    /// use chanview::channel::NewChannel;
    ///
    /// let channel = NewChannel {
    ///     name: "Habr".into(),
    ///     source: "http://habr.com".into(),
    ///     item_pattern: "(?s)<article>(.*?)</article>".into(),
    ///     link_pattern: String::new(),
    ///     title_pattern: String::new(),
    ///     description_pattern: String::new(),
    /// };
    /// let body = channel.form_body();
    /// assert!(body.starts_with("channel_name=Habr&channel_source=http%3A%2F%2Fhabr.com"));
    /// ```
    pub fn form_body(&self) -> String {
        let values = [
            &self.name,
            &self.source,
            &self.item_pattern,
            &self.link_pattern,
            &self.title_pattern,
            &self.description_pattern,
        ];
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        for (field, value) in FIELDS.iter().zip(values) {
            body.append_pair(field.key, value);
        }
        body.finish()
    }
}

/// Values typed into the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelForm {
    values: [String; 6],
    focused: usize,
    /// Last validation failure, shown under the inputs.
    pub error: Option<String>,
}

impl ChannelForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn value(&self, field: usize) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % FIELDS.len();
    }

    pub fn prev_field(&mut self) {
        self.focused = (self.focused + FIELDS.len() - 1) % FIELDS.len();
    }

    /// Type into the focused field. Returns false once the field is full.
    pub fn push(&mut self, c: char) -> bool {
        let value = &mut self.values[self.focused];
        if value.len() >= MAX_FIELD_LENGTH {
            return false;
        }
        value.push(c);
        self.error = None;
        true
    }

    pub fn pop(&mut self) {
        self.values[self.focused].pop();
        self.error = None;
    }

    /// Check the form and build the registration.
    ///
    /// Name, source and item pattern are required; the source must be an
    /// absolute http(s) URL. Whitespace is trimmed from the name and source
    /// only; patterns are posted as typed.
    pub fn submit(&self) -> Result<NewChannel, FormError> {
        let name = self.values[NAME].trim();
        if name.is_empty() {
            return Err(FormError::Missing(FIELDS[NAME].label));
        }
        let source = self.values[SOURCE].trim();
        if source.is_empty() {
            return Err(FormError::Missing(FIELDS[SOURCE].label));
        }
        let source = validate_link_for_open(source, None)?;
        if self.values[ITEM].is_empty() {
            return Err(FormError::Missing(FIELDS[ITEM].label));
        }

        Ok(NewChannel {
            name: name.to_owned(),
            source: source.to_string(),
            item_pattern: self.values[ITEM].clone(),
            link_pattern: self.values[LINK].clone(),
            title_pattern: self.values[TITLE].clone(),
            description_pattern: self.values[DESCRIPTION].clone(),
        })
    }
}
