//! Datetime range of a search.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format the backend expects on the wire.
pub const WIRE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Format of the range picker inputs.
pub const PICKER_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Longest lookback window accepted from users and config, ten years.
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 366 * 10;

/// Optional lower and upper bound. A `None` bound corresponds to a hidden
/// range control and is sent as an empty string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateTimeRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Open-ended window covering the last `hours` before `now`.
    ///
    /// `hours` is capped at [`MAX_LOOKBACK_HOURS`]. A start before the
    /// earliest representable datetime leaves the lower bound open.
    pub fn last_hours(now: NaiveDateTime, hours: u32) -> Self {
        let hours = hours.min(MAX_LOOKBACK_HOURS);
        Self {
            start: now.checked_sub_signed(Duration::hours(i64::from(hours))),
            end: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Parse the two picker strings. Blank strings mean "no bound".
    pub fn from_picker(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: parse_picker(start)?,
            end: parse_picker(end)?,
        })
    }

    pub fn to_wire(self) -> WireDateTime {
        WireDateTime {
            start: self.start.map(format_wire).unwrap_or_default(),
            end: self.end.map(format_wire).unwrap_or_default(),
        }
    }
}

/// `datetime` object of a search expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDateTime {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

pub fn format_wire(dt: NaiveDateTime) -> String {
    dt.format(WIRE_FORMAT).to_string()
}

pub fn format_picker(dt: NaiveDateTime) -> String {
    dt.format(PICKER_FORMAT).to_string()
}

/// Parse a picker value (`DD/MM/YYYY HH:mm`). Blank input yields `None`.
pub fn parse_picker(value: &str) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, PICKER_FORMAT).map(Some)
}
