//! CLI subcommand infrastructure for tamandua-web.

pub mod config;
pub mod dashboard;
pub mod init;
pub mod lookup;
pub mod search;

use crate::api::{Backend, CachedBackend, HttpBackend};
use crate::config::Config;
use crate::expression::datetime::MAX_LOOKBACK_HOURS;
use clap::{Args, Subcommand};
use std::sync::Arc;
use std::time::Duration;

/// Available subcommands for tamandua-web.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search mails and print the matching rows
    Search(SearchArgs),

    /// Print the aggregate overview
    Dashboard(DashboardArgs),

    /// List the columns the backend knows
    Columns,

    /// List the tags the backend knows
    Tags,

    /// Start the browser-based UI
    Web(WebArgs),

    /// Config file commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Create a tamandua.yaml config file in the current directory
    Init(InitArgs),
}

/// Arguments for the search subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Conditions like `sender=foo` (regex, case-insensitive), `action==reject`,
    /// `spamscore>=5` or `sender!=bar`
    #[arg(value_name = "CONDITION")]
    pub conditions: Vec<String>,

    /// Only mails from the last N hours
    #[arg(
        long,
        value_name = "HOURS",
        conflicts_with_all = ["start", "end"],
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_HOURS))
    )]
    pub last: Option<u32>,

    /// Range start, `DD/MM/YYYY HH:MM`
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, `DD/MM/YYYY HH:MM`
    #[arg(long)]
    pub end: Option<String>,

    /// Hide rows carrying this tag (repeatable)
    #[arg(long = "hide-tag", value_name = "TAG")]
    pub hide_tags: Vec<String>,

    /// Columns to print (default: the configured visible columns)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Output rows as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the dashboard subcommand.
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Lookback window in hours (default: from config)
    #[arg(
        long,
        value_name = "HOURS",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_HOURS))
    )]
    pub hours: Option<u32>,
}

/// Arguments for the web subcommand.
#[derive(Args, Debug)]
pub struct WebArgs {
    /// Bind host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port
    #[arg(short = 'p', long, default_value_t = 8421)]
    pub port: u16,
}

/// Config subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the config file
    Validate,
    /// Show effective configuration
    Show,
}

/// Arguments for the init subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

/// Build the cached HTTP backend for `config`.
pub fn connect(config: &Config) -> Result<Arc<dyn Backend>, i32> {
    let http = HttpBackend::new(
        &config.backend_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .map_err(|err| {
        eprintln!("error: {}", err);
        2
    })?;
    tracing::debug!(backend = http.base_url(), "Using backend");
    Ok(Arc::new(CachedBackend::new(
        http,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}
