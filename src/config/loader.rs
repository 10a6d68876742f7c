//! Config loading for tamandua-web.
//!
//! Loads and validates YAML config files. Global values are applied first,
//! project values override them key by key.

use std::fs;
use std::path::Path;

use reqwest::Url;

use crate::config::discovery::DiscoveryResult;
use crate::config::error::ConfigError;
use crate::config::types::{Config, RawConfig};
use crate::expression::datetime::MAX_LOOKBACK_HOURS;

/// Load and parse a YAML config file.
fn load_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(RawConfig::default());
    }

    let raw: RawConfig = serde_saphyr::from_str(&content)
        .map_err(|e| ConfigError::from_saphyr_error(path.to_path_buf(), e))?;
    validate(&raw, path)?;
    Ok(raw)
}

fn validate(raw: &RawConfig, path: &Path) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Validation {
        path: path.to_path_buf(),
        message,
    };

    if let Some(url) = &raw.backend_url {
        let parsed =
            Url::parse(url).map_err(|e| invalid(format!("invalid backend_url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "backend_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
    }

    let positive = [
        ("page_size", raw.page_size.map(|v| v as u64)),
        ("table_page_size", raw.table_page_size.map(|v| v as u64)),
        (
            "field_choices_threshold",
            raw.field_choices_threshold.map(|v| v as u64),
        ),
        (
            "dashboard_lookback_hours",
            raw.dashboard_lookback_hours.map(u64::from),
        ),
        ("dashboard_top_n", raw.dashboard_top_n.map(|v| v as u64)),
        ("dashboard_refresh_secs", raw.dashboard_refresh_secs),
        ("request_timeout_secs", raw.request_timeout_secs),
    ];
    for (key, value) in positive {
        if value == Some(0) {
            return Err(invalid(format!("{} must be greater than 0", key)));
        }
    }

    if let Some(hours) = raw.dashboard_lookback_hours {
        if hours > MAX_LOOKBACK_HOURS {
            return Err(invalid(format!(
                "dashboard_lookback_hours must be at most {}",
                MAX_LOOKBACK_HOURS
            )));
        }
    }

    if raw.visible_columns.as_ref().is_some_and(|c| c.is_empty()) {
        return Err(invalid("visible_columns must not be empty".to_string()));
    }

    Ok(())
}

/// Load a single config file on top of the defaults.
///
/// Used by `config validate` and `config show`, where the closest config
/// wins completely.
pub fn load_single_file(path: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    config.apply(load_file(path)?);
    Ok(config)
}

/// Load config from discovered config files.
///
/// Returns the defaults if no config files exist.
pub fn load(discovery: &DiscoveryResult) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    if let Some(global_path) = &discovery.global_config {
        config.apply(load_file(global_path)?);
    }

    if let Some(project_path) = &discovery.project_config {
        config.apply(load_file(project_path)?);
    }

    Ok(config)
}
