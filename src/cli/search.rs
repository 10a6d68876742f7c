//! `search`: run an expression from the command line and print the rows.

use crate::api::{Backend, ResultRow};
use crate::app::{Controller, SearchOutcome};
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::expression::{Comparator, DateTimeRange};
use crate::render::terminal::render_rows;
use crate::render::MessageKind;
use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use std::sync::Arc;

/// A parsed `FIELD<op>VALUE` argument.
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    comparator: Comparator,
    value: String,
}

fn parse_conditions(args: &[String]) -> Result<Vec<Condition>, String> {
    args.iter()
        .map(|arg| {
            Comparator::split_condition(arg)
                .map(|(field, comparator, value)| Condition {
                    field: field.to_string(),
                    comparator,
                    value: value.to_string(),
                })
                .ok_or_else(|| format!("invalid condition '{}', expected FIELD<op>VALUE", arg))
        })
        .collect()
}

fn resolve_range(args: &SearchArgs, now: NaiveDateTime) -> Result<DateTimeRange, String> {
    if let Some(hours) = args.last {
        return Ok(DateTimeRange::last_hours(now, hours));
    }
    let start = args.start.as_deref().unwrap_or("");
    let end = args.end.as_deref().unwrap_or("");
    DateTimeRange::from_picker(start, end)
        .map_err(|e| format!("invalid date ({}), expected DD/MM/YYYY HH:MM", e))
}

/// Run the search and return the rows that survive the tag filter.
fn execute(
    controller: &mut Controller,
    conditions: Vec<Condition>,
    hide_tags: &[String],
    range: DateTimeRange,
) -> Result<Vec<ResultRow>, i32> {
    for c in conditions {
        controller.push_line(&c.field, c.comparator, &c.value);
    }

    if !hide_tags.is_empty() && controller.load_tags() {
        for tag in hide_tags {
            if controller.toggle_tag(tag).is_none() {
                eprintln!("{} unknown tag '{}'", "warning:".yellow(), tag);
            }
        }
    }

    let outcome = controller.search(range);
    for message in controller.messages().messages() {
        match message.kind {
            MessageKind::Error => eprintln!("{} {}", "error:".red(), message.text),
            MessageKind::Warning => eprintln!("{} {}", "warning:".yellow(), message.text),
            MessageKind::Info => eprintln!("{}", message.text.dimmed()),
        }
    }

    match outcome {
        SearchOutcome::Rejected(_) | SearchOutcome::Failed(_) => Err(1),
        SearchOutcome::NoResults => Ok(Vec::new()),
        SearchOutcome::Loaded { .. } => {
            let table = controller.table();
            Ok(table
                .filtered_rows()
                .into_iter()
                .filter_map(|i| table.row(i).map(|r| r.data.clone()))
                .collect())
        }
    }
}

pub fn run(args: SearchArgs, backend: Arc<dyn Backend>, config: Config) -> Result<(), i32> {
    let conditions = parse_conditions(&args.conditions).map_err(|e| {
        eprintln!("error: {}", e);
        2
    })?;
    let range = resolve_range(&args, Local::now().naive_local()).map_err(|e| {
        eprintln!("error: {}", e);
        2
    })?;

    let mut controller = Controller::new(backend, config);
    let rows = execute(&mut controller, conditions, &args.hide_tags, range)?;

    if args.json {
        match serde_json::to_string_pretty(&rows) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return Err(1);
            }
        }
        return Ok(());
    }

    if rows.is_empty() {
        return Ok(());
    }

    let columns: Vec<&str> = if args.columns.is_empty() {
        controller.table().shown_columns()
    } else {
        args.columns.iter().map(String::as_str).collect()
    };
    print!("{}", render_rows(&columns, &rows));
    Ok(())
}
