//! Click-to-highlight inside the raw log block of a detail row.
//!
//! The block is HTML markup (escaped log text plus any highlight spans).
//! Highlighting is string-offset surgery on that markup; it is not aware of
//! tags, so the markup of earlier spans is part of later scans.

use crate::render::escape;
use std::collections::BTreeSet;

/// Highlight colours, picked in order as highlights are created.
pub const PALETTE: [&str; 12] = [
    "#fce94f", "#8ae234", "#fcaf3e", "#729fcf", "#ad7fa8", "#e9b96e", "#ef2929", "#34e2e2",
    "#c4a000", "#4e9a06", "#ce5c00", "#3465a4",
];

const SPAN_CLOSE: &str = "</span>";

fn span_open(color: &str) -> String {
    format!("<span class=\"highlight\" style=\"background-color: {}\">", color)
}

/// Log text of one detail row and the tokens currently highlighted in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBlock {
    markup: String,
    highlighted: BTreeSet<String>,
}

impl LogBlock {
    /// Build a block from raw log text.
    pub fn from_text(text: &str) -> Self {
        Self {
            markup: escape(text),
            highlighted: BTreeSet::new(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn is_highlighted(&self, token: &str) -> bool {
        self.highlighted.contains(token)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = &str> {
        self.highlighted.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// Token wrapped `matches` times with `color`.
    Highlighted { color: &'static str, matches: usize },
    /// Token spans removed.
    Cleared,
    /// Empty token; nothing changed.
    Ignored,
}

/// Owns the running colour counter shared by every block on the page.
#[derive(Debug, Default)]
pub struct Highlighter {
    counter: usize,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of highlights created so far.
    pub fn counter(&self) -> usize {
        self.counter
    }

    fn next_color(&self) -> &'static str {
        PALETTE[self.counter % (PALETTE.len() - 1)]
    }

    /// Highlight `token` in `block`, or clear it if it is already marked.
    pub fn toggle(&mut self, block: &mut LogBlock, token: &str) -> HighlightOutcome {
        if token.is_empty() {
            return HighlightOutcome::Ignored;
        }

        if block.highlighted.remove(token) {
            block.markup = unwrap_spans(&block.markup, &escape(token));
            return HighlightOutcome::Cleared;
        }

        let color = self.next_color();
        let (markup, matches) = wrap_matches(&block.markup, &escape(token), color);
        block.markup = markup;
        block.highlighted.insert(token.to_string());
        self.counter += 1;
        HighlightOutcome::Highlighted { color, matches }
    }
}

/// Wrap non-overlapping occurrences of `needle`, scanning left to right.
/// A match that starts exactly where the previous one ended stops the scan.
fn wrap_matches(source: &str, needle: &str, color: &str) -> (String, usize) {
    let open = span_open(color);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut last_end: Option<usize> = None;
    let mut matches = 0;

    while let Some(offset) = source[cursor..].find(needle) {
        let start = cursor + offset;
        if last_end == Some(start) {
            break;
        }
        let end = start + needle.len();

        out.push_str(&source[cursor..start]);
        out.push_str(&open);
        out.push_str(needle);
        out.push_str(SPAN_CLOSE);

        matches += 1;
        last_end = Some(end);
        cursor = end;
    }

    out.push_str(&source[cursor..]);
    (out, matches)
}

/// Remove every highlight span whose content is exactly `needle`.
fn unwrap_spans(source: &str, needle: &str) -> String {
    const OPEN_PREFIX: &str = "<span class=\"highlight\" style=\"background-color: ";

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    while let Some(offset) = source[cursor..].find(OPEN_PREFIX) {
        let start = cursor + offset;
        let after_prefix = start + OPEN_PREFIX.len();

        let unwrapped = source[after_prefix..].find("\">").and_then(|close| {
            let content_start = after_prefix + close + 2;
            let content_end = content_start + needle.len();
            let rest = source.get(content_start..)?;
            (rest.starts_with(needle) && source[content_end..].starts_with(SPAN_CLOSE))
                .then_some(content_end + SPAN_CLOSE.len())
        });

        match unwrapped {
            Some(next) => {
                out.push_str(&source[cursor..start]);
                out.push_str(needle);
                cursor = next;
            }
            None => {
                out.push_str(&source[cursor..after_prefix]);
                cursor = after_prefix;
            }
        }
    }

    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "Jan 19 22:51:45 phd-mxin postfix/smtpd[1]: 4A1B: client=mx.example.com\n\
                       Jan 19 22:51:46 phd-mxin postfix/cleanup[2]: 4A1B: message-id=<x@example.com>";

    #[test]
    fn test_highlight_wraps_every_occurrence() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text(LOG);

        let outcome = hl.toggle(&mut block, "4A1B");
        assert_eq!(
            outcome,
            HighlightOutcome::Highlighted {
                color: PALETTE[0],
                matches: 2
            }
        );
        assert_eq!(block.markup().matches("class=\"highlight\"").count(), 2);
        assert!(block.is_highlighted("4A1B"));
        assert_eq!(hl.counter(), 1);
    }

    #[test]
    fn test_toggle_twice_restores_markup() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text(LOG);
        let before = block.markup().to_string();

        hl.toggle(&mut block, "example.com");
        assert_ne!(block.markup(), before);

        assert_eq!(hl.toggle(&mut block, "example.com"), HighlightOutcome::Cleared);
        assert_eq!(block.markup(), before);
        assert!(!block.is_highlighted("example.com"));
        assert_eq!(hl.counter(), 1);
    }

    #[test]
    fn test_clear_keeps_other_highlights() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text(LOG);

        hl.toggle(&mut block, "4A1B");
        let with_first = block.markup().to_string();
        hl.toggle(&mut block, "postfix");
        hl.toggle(&mut block, "postfix");
        assert_eq!(block.markup(), with_first);
        assert!(block.is_highlighted("4A1B"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text("Postfix postfix");
        hl.toggle(&mut block, "postfix");
        assert!(block.markup().starts_with("Postfix <span"));
    }

    #[test]
    fn test_adjacent_match_stops_scan() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text("abab x ab");
        let outcome = hl.toggle(&mut block, "ab");
        assert_eq!(
            outcome,
            HighlightOutcome::Highlighted {
                color: PALETTE[0],
                matches: 1
            }
        );
        assert!(block.markup().ends_with("ab x ab"));
    }

    #[test]
    fn test_palette_wraps_before_last_color() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text("t0 t1 t2 t3 t4 t5 t6 t7 t8 t9 t10 t11 t12");
        let mut colors = Vec::new();
        for i in 0..PALETTE.len() {
            if let HighlightOutcome::Highlighted { color, .. } =
                hl.toggle(&mut block, &format!("t{} ", i))
            {
                colors.push(color);
            }
        }
        assert_eq!(colors[PALETTE.len() - 1], PALETTE[0]);
        assert!(!colors.contains(&PALETTE[PALETTE.len() - 1]));
    }

    #[test]
    fn test_escaped_token_matches_escaped_block() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text("message-id=<x@example.com>");
        let before = block.markup().to_string();
        hl.toggle(&mut block, "<x@example.com>");
        assert!(block.markup().contains(">&lt;x@example.com&gt;</span>"));
        hl.toggle(&mut block, "<x@example.com>");
        assert_eq!(block.markup(), before);
    }

    #[test]
    fn test_empty_token_ignored() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text(LOG);
        assert_eq!(hl.toggle(&mut block, ""), HighlightOutcome::Ignored);
        assert_eq!(hl.counter(), 0);
    }

    #[test]
    fn test_scan_includes_previous_span_markup() {
        let mut hl = Highlighter::new();
        let mut block = LogBlock::from_text("a highlight word");
        hl.toggle(&mut block, "word");
        let outcome = hl.toggle(&mut block, "highlight");
        // The earlier span's class attribute is part of the scanned markup.
        assert_eq!(
            outcome,
            HighlightOutcome::Highlighted {
                color: PALETTE[1],
                matches: 2
            }
        );
    }
}
