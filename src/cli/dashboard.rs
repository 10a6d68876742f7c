//! `dashboard`: print the aggregate overview once.

use crate::api::Backend;
use crate::cli::DashboardArgs;
use crate::config::Config;
use crate::dashboard::{render, Dashboard, ItemResult};
use chrono::Local;
use std::sync::Arc;

pub fn run(args: DashboardArgs, backend: Arc<dyn Backend>, config: &Config) -> Result<(), i32> {
    let hours = args.hours.unwrap_or(config.dashboard_lookback_hours);
    let mut dashboard = Dashboard::new(hours, config.dashboard_top_n);
    dashboard.refresh(backend.as_ref(), Local::now().naive_local());
    let Some(snapshot) = dashboard.snapshot() else {
        return Err(1);
    };

    let all_failed = snapshot
        .results
        .iter()
        .all(|(_, r)| matches!(r, ItemResult::Failed(_)));

    print!("{}", render::render_text(dashboard.items(), snapshot));
    if all_failed {
        return Err(1);
    }
    Ok(())
}
