//! Plain-text table output for the command line.

use super::table::is_danger;
use crate::api::{display_value, ResultRow};
use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a single cell may get before it is cut with an ellipsis.
pub const MAX_CELL_WIDTH: usize = 48;

/// Cut `text` to at most `max` display columns.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

/// Pad `text` with spaces to `width` display columns.
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Aligned table of `columns` over `rows`. Newlines inside cells are
/// flattened; dangerous cells are printed in red.
pub fn render_rows(columns: &[&str], rows: &[ResultRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| {
                    let text = row.get(*c).map(display_value).unwrap_or_default();
                    truncate(&text.replace('\n', " "), MAX_CELL_WIDTH)
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].width())
                .chain(std::iter::once(c.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w).bold().to_string())
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for (row, texts) in rows.iter().zip(&cells) {
        let line: Vec<String> = columns
            .iter()
            .zip(texts)
            .zip(&widths)
            .map(|((column, text), w)| {
                let padded = pad(text, *w);
                match row.get(*column) {
                    Some(value) if is_danger(column, value) => padded.red().to_string(),
                    _ => padded,
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
