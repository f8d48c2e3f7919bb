use std::borrow::Cow;

use scraper::{Html, Node};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns.
///
/// CJK characters and most emoji take two columns, combining marks none.
///
/// # Examples
///
/// ```
/// use chanview::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Longest prefix of `s` that fits in `max_width` columns, as a byte index.
fn fit_prefix(s: &str, max_width: usize) -> usize {
    let mut width = 0;
    for (idx, c) in s.char_indices() {
        let w = char_width(c);
        if width + w > max_width {
            return idx;
        }
        width += w;
    }
    s.len()
}

/// Truncate a string to fit within `max_width` columns, appending "..." when cut.
///
/// Widths of three columns or less have no room for the ellipsis and just
/// keep whatever characters fit. Returns `Cow::Borrowed` when nothing is cut.
///
/// # Examples
///
/// ```
/// use chanview::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(s[..fit_prefix(s, max_width)].to_string());
    }
    let cut = fit_prefix(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
}

fn is_stripped_control(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Item titles and bodies come from arbitrary feeds and must not be able to
/// drive the terminal. Removes C0/C1 controls and DEL, CSI sequences
/// (`ESC [ ... final`), OSC sequences (`ESC ] ... BEL` or `ESC ] ... ESC \`)
/// and bare ESC. Tab, newline and carriage return are kept.
///
/// Returns `Cow::Borrowed` when the input is already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameters run until the final byte in 0x40..=0x7E.
                    for p in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&p) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(p) = chars.next() {
                        if p == '\u{07}' {
                            break;
                        }
                        if p == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_stripped_control(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Elements that start a new line when flattened to text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "pre", "tr", "table", "section", "article", "hr",
];

/// Reduce an HTML fragment to plain text lines.
///
/// Entities are decoded, `script`/`style` content is dropped, and block
/// elements start new lines. Runs of whitespace inside a line collapse to one
/// space and blank lines are removed. Plain text without markup passes
/// through with only whitespace normalization.
///
/// # Examples
///
/// ```
/// use chanview::util::markup_to_text;
///
/// assert_eq!(markup_to_text("<p>Fish &amp; chips</p><p>Tea</p>"), "Fish & chips\nTea");
/// assert_eq!(markup_to_text("plain   words"), "plain words");
/// ```
pub fn markup_to_text(s: &str) -> String {
    let raw = if s.contains('<') || s.contains('&') {
        let fragment = Html::parse_fragment(s);
        let mut raw = String::with_capacity(s.len());
        for node in fragment.root_element().descendants() {
            match node.value() {
                Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => raw.push('\n'),
                Node::Text(text) => {
                    let hidden = node
                        .parent()
                        .and_then(|p| p.value().as_element())
                        .is_some_and(|el| matches!(el.name(), "script" | "style"));
                    if !hidden {
                        raw.push_str(text);
                    }
                }
                _ => {}
            }
        }
        raw
    } else {
        s.to_string()
    };

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Word-wrap text to `width` columns.
///
/// Existing line breaks are kept. Words wider than the line are split at
/// character boundaries. Empty input yields no lines.
///
/// # Examples
///
/// ```
/// use chanview::util::wrap_text;
///
/// assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
/// ```
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_width = display_width(word);

            if line_width > 0 && line_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            while word_width > width {
                // Word alone is wider than a line: hard split.
                if line_width > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                }
                let first = word.chars().next().map_or(0, char::len_utf8);
                let cut = fit_prefix(word, width).max(first);
                lines.push(word[..cut].to_string());
                word = &word[cut..];
                word_width = display_width(word);
            }

            if word.is_empty() {
                continue;
            }
            if line_width > 0 {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
        }

        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}
