use thiserror::Error;
use url::Url;

/// Why an item link was refused before handing it to the system browser.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Item has no link")]
    Empty,
    #[error("Invalid link: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Link contains control characters")]
    ControlChars,
}

/// Validate an item link before `open::that`.
///
/// Item links come straight from third-party feeds, so anything that is not
/// a plain http(s) URL is refused. Relative links are resolved against
/// `base` (the server page) when one is given.
///
/// # Examples
///
/// ```
/// use chanview::util::validate_link_for_open;
///
/// assert!(validate_link_for_open("https://example.com/post/1", None).is_ok());
/// assert!(validate_link_for_open("javascript:alert(1)", None).is_err());
/// ```
pub fn validate_link_for_open(link: &str, base: Option<&Url>) -> Result<Url, UrlValidationError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if link.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlChars);
    }

    let url = match (Url::parse(link), base) {
        (Ok(url), _) => url,
        (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(link)?,
        (Err(e), _) => return Err(e.into()),
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}
