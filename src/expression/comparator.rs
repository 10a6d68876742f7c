//! Comparators of an expression line.
//!
//! The wire values are what the backend's expression parser accepts. The UI
//! shows HTML-escaped labels and only cycles through the subset in
//! [`Comparator::CYCLE`]; the label `=` means a case-insensitive regex match.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// Case-insensitive regex match. Shown as `=`.
    #[default]
    #[serde(rename = "re_i")]
    RegexInsensitive,
    /// Literal equality. Not part of the UI cycle.
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Comparator {
    /// Display order of the comparator button.
    pub const CYCLE: [Comparator; 6] = [
        Comparator::RegexInsensitive,
        Comparator::NotEqual,
        Comparator::Greater,
        Comparator::Less,
        Comparator::GreaterOrEqual,
        Comparator::LessOrEqual,
    ];

    /// Value sent to the backend.
    pub fn wire(self) -> &'static str {
        match self {
            Comparator::RegexInsensitive => "re_i",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterOrEqual => ">=",
            Comparator::LessOrEqual => "<=",
        }
    }

    /// HTML-escaped button label.
    pub fn label(self) -> &'static str {
        match self {
            Comparator::RegexInsensitive | Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::Greater => "&gt;",
            Comparator::Less => "&lt;",
            Comparator::GreaterOrEqual => "&gt;=",
            Comparator::LessOrEqual => "&lt;=",
        }
    }

    /// Map a button label back to its comparator.
    ///
    /// Accepts escaped (`&gt;=`) and raw (`>=`) labels. `=` maps to the regex
    /// comparator, never to literal equality.
    pub fn from_label(label: &str) -> Option<Comparator> {
        let raw = label.trim().replace("&gt;", ">").replace("&lt;", "<");
        match raw.as_str() {
            "=" => Some(Comparator::RegexInsensitive),
            "!=" => Some(Comparator::NotEqual),
            ">" => Some(Comparator::Greater),
            "<" => Some(Comparator::Less),
            ">=" => Some(Comparator::GreaterOrEqual),
            "<=" => Some(Comparator::LessOrEqual),
            _ => None,
        }
    }

    /// Next comparator in [`Comparator::CYCLE`], wrapping after the last.
    ///
    /// Literal equality is outside the cycle and re-enters it at the start.
    pub fn next(self) -> Comparator {
        match Self::CYCLE.iter().position(|&c| c == self) {
            Some(idx) => Self::CYCLE[(idx + 1) % Self::CYCLE.len()],
            None => Self::CYCLE[0],
        }
    }

    /// Split a CLI condition such as `spamscore>=5` into field, comparator
    /// and value. `=` is the regex match, `==` is literal equality.
    pub fn split_condition(input: &str) -> Option<(&str, Comparator, &str)> {
        // Longest operators first so `>=` is not read as `>`.
        const OPERATORS: [(&str, Comparator); 7] = [
            ("==", Comparator::Equal),
            ("!=", Comparator::NotEqual),
            (">=", Comparator::GreaterOrEqual),
            ("<=", Comparator::LessOrEqual),
            ("=", Comparator::RegexInsensitive),
            (">", Comparator::Greater),
            ("<", Comparator::Less),
        ];

        let (idx, op, comparator) = OPERATORS
            .iter()
            .filter_map(|&(op, c)| input.find(op).map(|idx| (idx, op, c)))
            .min_by_key(|&(idx, op, _)| (idx, std::cmp::Reverse(op.len())))?;

        let field = input[..idx].trim();
        if field.is_empty() {
            return None;
        }
        Some((field, comparator, input[idx + op.len()..].trim()))
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire())
    }
}
