//! `init`: write a starter `tamandua.yaml`.

use crate::cli::InitArgs;
use crate::config::discovery::PROJECT_CONFIG_NAME;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE: &str = "\
# tamandua-web configuration
#
# Every key is optional. Run `tamandua-web config show` to see the
# effective values.

# Base URL of the Tamandua backend.
backend_url: http://localhost:8080

# Rows requested per search.
# page_size: 200

# Rows per page of the result table.
# table_page_size: 20

# Columns shown in the result table.
# visible_columns: [phdmxin_time, sender, recipient, messageid, tags]

# Fields with fewer distinct values than this get a dropdown.
# field_choices_threshold: 20

# dashboard_lookback_hours: 24
# dashboard_top_n: 10
# dashboard_refresh_secs: 60

# request_timeout_secs: 30
# cache_ttl_secs: 300
";

pub fn run(args: InitArgs) -> Result<(), i32> {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: Cannot determine current directory: {}", e);
            return Err(1);
        }
    };

    match write_config(&cwd, args.force) {
        Ok(path) => {
            println!("{} {}", "Created".green(), path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            Err(1)
        }
    }
}

fn write_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(PROJECT_CONFIG_NAME);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(&path, TEMPLATE).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
