//! Config error types for tamandua-web.
//!
//! Provides rich error messages with file locations and typo suggestions.

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use strsim::jaro_winkler;

use super::types::KNOWN_KEYS;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Error loading or parsing a config file.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading the config file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error.
    Parse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
        suggestion: Option<String>,
    },

    /// Semantic error after parsing.
    Validation { path: PathBuf, message: String },
}

fn location_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"line (\d+),? col(?:umn)? (\d+)").expect("valid regex"))
}

fn unknown_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"unknown field `([^`]+)`").expect("valid regex"))
}

/// Closest known config key to `name`, if any is similar enough.
pub fn suggest_key(name: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .filter(|&&known| jaro_winkler(name, known) >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| {
            jaro_winkler(name, a)
                .partial_cmp(&jaro_winkler(name, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|&s| s.to_string())
}

impl ConfigError {
    /// Build a parse error from a YAML deserialization error, pulling the
    /// location and unknown key out of its message.
    pub fn from_saphyr_error(path: PathBuf, err: impl fmt::Display) -> Self {
        let message = err.to_string();
        let (line, column) = location_regex()
            .captures(&message)
            .map(|caps| (caps[1].parse().ok(), caps[2].parse().ok()))
            .unwrap_or((None, None));
        let suggestion = unknown_field_regex()
            .captures(&message)
            .and_then(|caps| suggest_key(&caps[1]));

        ConfigError::Parse {
            path,
            message: message.lines().next().unwrap_or_default().to_string(),
            line,
            column,
            suggestion,
        }
    }

    /// Format error in Cargo-style format.
    pub fn format_cargo_style(&self) -> String {
        match self {
            ConfigError::Io { path, source } => {
                format!(
                    "error: cannot read config file\n  --> {}\n  |\n  = {}\n",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse {
                path,
                message,
                line,
                column,
                suggestion,
            } => {
                let location = match (line, column) {
                    (Some(l), Some(c)) => format!("{}:{}:{}", path.display(), l, c),
                    (Some(l), None) => format!("{}:{}", path.display(), l),
                    _ => format!("{}", path.display()),
                };
                let mut output = format!("error: {}\n  --> {}\n  |\n", message, location);
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("  = help: did you mean `{}`?\n", suggestion));
                }
                output
            }
            ConfigError::Validation { path, message } => {
                format!("error: {}\n  --> {}\n  |\n", message, path.display())
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_cargo_style())
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
