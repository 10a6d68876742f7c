//! `config validate` and `config show`.
//!
//! Both commands look at the closest config file only: a project
//! `tamandua.yaml` wins over the global one when both exist.

use crate::config::{self, Config};
use colored::Colorize;
use std::path::PathBuf;

fn effective_config_path() -> Option<PathBuf> {
    config::discover().closest().map(|p| p.to_path_buf())
}

/// Quiet on success, cargo-style error on stderr and exit 1 on failure.
pub fn validate() -> Result<(), i32> {
    let config_path = match effective_config_path() {
        Some(path) => path,
        None => {
            eprintln!("error: No config found to validate");
            return Err(1);
        }
    };

    match config::load_single_file(&config_path) {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", e);
            Err(1)
        }
    }
}

pub fn show() -> Result<(), i32> {
    match effective_config_path() {
        Some(path) => match config::load_single_file(&path) {
            Ok(cfg) => {
                println!("Using: {}", path.display().to_string().dimmed());
                println!();
                show_config(&cfg);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                Err(1)
            }
        },
        None => {
            println!("{}", "No config found. Using defaults.".dimmed());
            println!();
            show_config(&Config::default());
            Ok(())
        }
    }
}

fn show_config(cfg: &Config) {
    let defaults = Config::default().entries();
    for (key, value) in cfg.entries() {
        let is_default = defaults.iter().any(|(k, v)| *k == key && *v == value);
        if is_default {
            println!("{}: {}", key.cyan(), value.dimmed());
        } else {
            println!("{}: {}", key.cyan(), value.green());
        }
    }
}
