//! Aggregate overview of recent mail traffic.
//!
//! The dashboard is a fixed table of [`DashboardItem`]s. A refresh runs every
//! item against the backend in parallel and collects the outcomes into a
//! [`DashboardSnapshot`]; each item succeeds or fails on its own.

pub mod items;
pub mod render;

pub use items::{default_items, DashboardItem, ItemKind};

use crate::api::{AdvCountResponse, Backend};
use crate::expression::datetime::MAX_LOOKBACK_HOURS;
use crate::expression::{Comparator, DateTimeRange, ExpressionField};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Number of distinct bar colours; percentages map onto it by rounding.
pub const BAR_PALETTE_LEN: usize = 101;

/// `100 * value / total` rounded to two decimals; `0` for an empty total.
pub fn percentage(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = 100.0 * value as f64 / total as f64;
    (pct * 100.0).round() / 100.0
}

pub fn format_percentage(pct: f64) -> String {
    format!("{:.2}", pct)
}

/// Bar colour for a percentage, from green (0) to red (100).
pub fn bar_color(pct: f64) -> String {
    let index = (pct.round().max(0.0) as usize) % BAR_PALETTE_LEN;
    let hue = 120 * (BAR_PALETTE_LEN - 1 - index) / (BAR_PALETTE_LEN - 1);
    format!("hsl({}, 70%, 45%)", hue)
}

/// Check a user-supplied lookback window.
pub fn validate_lookback(hours: u32) -> Result<u32, String> {
    if (1..=MAX_LOOKBACK_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(format!(
            "Lookback must be between 1 and {} hours, got {}",
            MAX_LOOKBACK_HOURS, hours
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemResult {
    Total(u64),
    TopN(AdvCountResponse),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub window: DateTimeRange,
    pub lookback_hours: u32,
    pub results: Vec<(&'static str, ItemResult)>,
}

impl DashboardSnapshot {
    pub fn result(&self, key: &str) -> Option<&ItemResult> {
        self.results.iter().find(|(k, _)| *k == key).map(|(_, r)| r)
    }

    /// Total processed mails, the denominator for the other totals.
    pub fn processed(&self) -> u64 {
        match self.result(items::PROCESSED) {
            Some(ItemResult::Total(n)) => *n,
            _ => 0,
        }
    }
}

/// Search implied by clicking a top-N entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillDown {
    pub fields: Vec<ExpressionField>,
    pub range: DateTimeRange,
}

pub struct Dashboard {
    items: Vec<DashboardItem>,
    lookback_hours: u32,
    top_n: usize,
    snapshot: Option<DashboardSnapshot>,
    refreshed_at: Option<Instant>,
}

impl Dashboard {
    pub fn new(lookback_hours: u32, top_n: usize) -> Self {
        Self {
            items: default_items(),
            lookback_hours: lookback_hours.clamp(1, MAX_LOOKBACK_HOURS),
            top_n,
            snapshot: None,
            refreshed_at: None,
        }
    }

    pub fn items(&self) -> &[DashboardItem] {
        &self.items
    }

    pub fn lookback_hours(&self) -> u32 {
        self.lookback_hours
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    /// Change the lookback window, clamped to `1..=MAX_LOOKBACK_HOURS`.
    /// Returns true if it changed, in which case the current snapshot is
    /// stale.
    pub fn set_lookback(&mut self, hours: u32) -> bool {
        let hours = hours.clamp(1, MAX_LOOKBACK_HOURS);
        if hours == self.lookback_hours {
            return false;
        }
        self.lookback_hours = hours;
        self.refreshed_at = None;
        true
    }

    pub fn needs_refresh(&self, interval: Duration) -> bool {
        self.refreshed_at.map_or(true, |at| at.elapsed() >= interval)
    }

    pub fn refresh(&mut self, backend: &dyn Backend, now: NaiveDateTime) -> &DashboardSnapshot {
        let window = DateTimeRange::last_hours(now, self.lookback_hours);
        let top_n = self.top_n;
        debug!(hours = self.lookback_hours, items = self.items.len(), "Refreshing dashboard");

        let results = self
            .items
            .par_iter()
            .map(|item| {
                let result = match item.run(backend, window, top_n) {
                    Ok(result) => result,
                    Err(err) => {
                        warn!(item = item.key, error = %err, "Dashboard query failed");
                        ItemResult::Failed(err.user_message())
                    }
                };
                (item.key, result)
            })
            .collect();

        self.refreshed_at = Some(Instant::now());
        self.snapshot.insert(DashboardSnapshot {
            window,
            lookback_hours: self.lookback_hours,
            results,
        })
    }

    /// Filters for a clicked top-N entry: the item's own filters plus the
    /// entry value as a case-insensitive regex, over the lookback window.
    pub fn drill_down(&self, item_key: &str, entry: &str, now: NaiveDateTime) -> Option<DrillDown> {
        let item = self.items.iter().find(|i| i.key == item_key)?;
        let group = item.group_by.as_ref()?;

        let value = match group.sep {
            Some(sep) if sep == "@" => format!("@{}$", regex::escape(entry)),
            _ => regex::escape(entry),
        };

        let mut fields = item.filters();
        fields.push(ExpressionField::new(group.field, Comparator::RegexInsensitive, value));

        Some(DrillDown {
            fields,
            range: DateTimeRange::last_hours(now, self.lookback_hours),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, CountItem};
    use crate::test_utils::MockBackend;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(7, 0), 0.0);
        assert_eq!(format_percentage(percentage(50, 200)), "25.00");
        assert_eq!(format_percentage(percentage(1, 3)), "33.33");
        assert_eq!(format_percentage(percentage(0, 10)), "0.00");
    }

    #[test]
    fn test_bar_color_wraps_into_palette() {
        assert_eq!(bar_color(0.0), "hsl(120, 70%, 45%)");
        assert_eq!(bar_color(100.0), "hsl(0, 70%, 45%)");
        assert_eq!(bar_color(49.6), bar_color(50.0));
    }

    #[test]
    fn test_refresh_collects_every_item() {
        let mut backend = MockBackend::new();
        backend.counts.insert(String::new(), 200);
        backend.counts.insert("tags:spam".into(), 50);
        backend.adv_counts.insert(
            "sender".into(),
            AdvCountResponse {
                total: 10,
                items: vec![CountItem {
                    key: "a@b.com".into(),
                    value: 4,
                }],
            },
        );

        let mut dashboard = Dashboard::new(24, 10);
        let snapshot = dashboard.refresh(&backend, now());

        assert_eq!(snapshot.results.len(), default_items().len());
        assert_eq!(snapshot.processed(), 200);
        assert_eq!(snapshot.result("spam"), Some(&ItemResult::Total(50)));
        assert!(matches!(snapshot.result("senders"), Some(ItemResult::TopN(r)) if r.total == 10));
        assert_eq!(snapshot.window, DateTimeRange::last_hours(now(), 24));
    }

    #[test]
    fn test_failed_item_does_not_block_others() {
        let mut backend = MockBackend::new();
        backend.counts.insert(String::new(), 5);
        backend.fail_next(
            "adv_count",
            ApiError::Server {
                message: "boom".into(),
            },
        );

        let mut dashboard = Dashboard::new(24, 10);
        let snapshot = dashboard.refresh(&backend, now());

        let failed = snapshot
            .results
            .iter()
            .filter(|(_, r)| matches!(r, ItemResult::Failed(m) if m.ends_with("boom")))
            .count();
        assert_eq!(failed, 1);
        assert_eq!(snapshot.processed(), 5);
    }

    #[test]
    fn test_set_lookback_marks_stale() {
        let backend = MockBackend::new();
        let mut dashboard = Dashboard::new(24, 10);
        assert!(dashboard.needs_refresh(Duration::from_secs(60)));
        dashboard.refresh(&backend, now());
        assert!(!dashboard.needs_refresh(Duration::from_secs(60)));

        assert!(!dashboard.set_lookback(24));
        assert!(dashboard.set_lookback(48));
        assert!(dashboard.needs_refresh(Duration::from_secs(60)));
        assert_eq!(dashboard.refresh(&backend, now()).lookback_hours, 48);
    }

    #[test]
    fn test_lookback_bounds() {
        assert_eq!(validate_lookback(1), Ok(1));
        assert_eq!(validate_lookback(MAX_LOOKBACK_HOURS), Ok(MAX_LOOKBACK_HOURS));
        assert!(validate_lookback(0).is_err());
        assert!(validate_lookback(MAX_LOOKBACK_HOURS + 1).is_err());

        let backend = MockBackend::new();
        let mut dashboard = Dashboard::new(u32::MAX, 10);
        assert_eq!(dashboard.lookback_hours(), MAX_LOOKBACK_HOURS);
        assert!(!dashboard.set_lookback(4_000_000_000));
        let snapshot = dashboard.refresh(&backend, now());
        assert_eq!(
            snapshot.window,
            DateTimeRange::last_hours(now(), MAX_LOOKBACK_HOURS)
        );
    }

    #[test]
    fn test_drill_down_domain_is_anchored() {
        let dashboard = Dashboard::new(12, 10);
        let drill = dashboard
            .drill_down("sender_domains", "example.com", now())
            .unwrap();
        assert_eq!(
            drill.fields,
            vec![ExpressionField::new(
                "sender",
                Comparator::RegexInsensitive,
                r"@example\.com$"
            )]
        );
        assert_eq!(drill.range, DateTimeRange::last_hours(now(), 12));
    }

    #[test]
    fn test_drill_down_keeps_item_filters() {
        let dashboard = Dashboard::new(24, 10);
        let drill = dashboard
            .drill_down("reject_reasons", "Recipient address rejected (550)", now())
            .unwrap();
        assert_eq!(
            drill.fields,
            vec![
                ExpressionField::new("action", Comparator::Equal, "reject"),
                ExpressionField::new(
                    "rejectreason",
                    Comparator::RegexInsensitive,
                    r"Recipient address rejected \(550\)"
                ),
            ]
        );
        assert!(dashboard.drill_down("processed", "x", now()).is_none());
        assert!(dashboard.drill_down("unknown", "x", now()).is_none());
    }
}
