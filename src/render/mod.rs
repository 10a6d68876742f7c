//! HTML and terminal rendering of search state.
//!
//! Fragments are plain strings. Every piece of backend data goes through
//! [`escape`] before it is embedded.

pub mod messages;
pub mod table;
pub mod tags;
pub mod terminal;

pub use messages::{Message, MessageKind, MessagePanel};
pub use table::{ResultTable, LOGLINES_COLUMN, TAGS_COLUMN};
pub use tags::TagFilter;

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }
}
