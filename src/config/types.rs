//! Config types for tamandua-web.

use serde::Deserialize;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: usize = 200;
pub const DEFAULT_TABLE_PAGE_SIZE: usize = 20;
pub const DEFAULT_VISIBLE_COLUMNS: [&str; 5] =
    ["phdmxin_time", "sender", "recipient", "messageid", "tags"];
pub const DEFAULT_FIELD_CHOICES_THRESHOLD: usize = 20;
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Every key accepted in a config file, used for typo suggestions.
pub const KNOWN_KEYS: [&str; 10] = [
    "backend_url",
    "page_size",
    "table_page_size",
    "visible_columns",
    "field_choices_threshold",
    "dashboard_lookback_hours",
    "dashboard_top_n",
    "dashboard_refresh_secs",
    "request_timeout_secs",
    "cache_ttl_secs",
];

/// Raw config file structure. Every key is optional; unknown keys are
/// rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub backend_url: Option<String>,
    /// Rows requested per search (the server-side page cap).
    pub page_size: Option<usize>,
    /// Rows per page of the rendered table.
    pub table_page_size: Option<usize>,
    pub visible_columns: Option<Vec<String>>,
    pub field_choices_threshold: Option<usize>,
    pub dashboard_lookback_hours: Option<u32>,
    pub dashboard_top_n: Option<usize>,
    pub dashboard_refresh_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
}

/// Effective configuration after merging global and project files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub page_size: usize,
    pub table_page_size: usize,
    pub visible_columns: Vec<String>,
    pub field_choices_threshold: usize,
    pub dashboard_lookback_hours: u32,
    pub dashboard_top_n: usize,
    pub dashboard_refresh_secs: u64,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            table_page_size: DEFAULT_TABLE_PAGE_SIZE,
            visible_columns: DEFAULT_VISIBLE_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            field_choices_threshold: DEFAULT_FIELD_CHOICES_THRESHOLD,
            dashboard_lookback_hours: DEFAULT_LOOKBACK_HOURS,
            dashboard_top_n: DEFAULT_TOP_N,
            dashboard_refresh_secs: DEFAULT_REFRESH_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    /// Overlay the keys set in `raw`.
    pub fn apply(&mut self, raw: RawConfig) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if let Some(value) = raw.$field {
                    self.$field = value;
                })*
            };
        }
        overlay!(
            backend_url,
            page_size,
            table_page_size,
            visible_columns,
            field_choices_threshold,
            dashboard_lookback_hours,
            dashboard_top_n,
            dashboard_refresh_secs,
            request_timeout_secs,
            cache_ttl_secs
        );
    }

    /// `(key, value)` pairs for display.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("backend_url", self.backend_url.clone()),
            ("page_size", self.page_size.to_string()),
            ("table_page_size", self.table_page_size.to_string()),
            ("visible_columns", self.visible_columns.join(", ")),
            (
                "field_choices_threshold",
                self.field_choices_threshold.to_string(),
            ),
            (
                "dashboard_lookback_hours",
                self.dashboard_lookback_hours.to_string(),
            ),
            ("dashboard_top_n", self.dashboard_top_n.to_string()),
            (
                "dashboard_refresh_secs",
                self.dashboard_refresh_secs.to_string(),
            ),
            ("request_timeout_secs", self.request_timeout_secs.to_string()),
            ("cache_ttl_secs", self.cache_ttl_secs.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides_only_set_keys() {
        let mut config = Config::default();
        config.apply(RawConfig {
            page_size: Some(50),
            visible_columns: Some(vec!["sender".into()]),
            ..Default::default()
        });
        assert_eq!(config.page_size, 50);
        assert_eq!(config.visible_columns, vec!["sender".to_string()]);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.dashboard_lookback_hours, 24);
    }

    #[test]
    fn test_entries_cover_known_keys() {
        let config = Config::default();
        let keys: Vec<&str> = config.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, KNOWN_KEYS.to_vec());
    }
}
