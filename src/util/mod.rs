//! Utility functions for common operations.
//!
//! - **Link validation**: only plain http(s) item links reach the system browser
//! - **Text processing**: Unicode-aware width, truncation and wrapping, plus
//!   control-character and markup stripping for feed-supplied text
//!
//! # Examples
//!
//! ```
//! use chanview::util::{display_width, markup_to_text, truncate_to_width};
//!
//! let body = markup_to_text("<p>Hello <b>world</b></p>");
//! assert_eq!(body, "Hello world");
//! assert_eq!(display_width(&body), 11);
//! assert_eq!(truncate_to_width(&body, 8), "Hello...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, markup_to_text, strip_control_chars, truncate_to_width, wrap_text};
pub use url_validator::{validate_link_for_open, UrlValidationError};

/// Maximum filter length accepted from the input bar.
pub const MAX_FILTER_LENGTH: usize = 256;
