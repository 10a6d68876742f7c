use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tamandua_web::api::Backend;
use tamandua_web::cli::{self, Commands, ConfigAction};
use tamandua_web::config::{self, Config};
use tamandua_web::{logging, web};

#[derive(Parser, Debug)]
#[command(name = "tamandua-web")]
#[command(about = "Search and dashboard client for the Tamandua mail log backend", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Backend URL, overriding the config file
    #[arg(long, global = true, value_name = "URL")]
    backend: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn load_config(backend: Option<String>) -> Result<Config> {
    let discovery = config::discover();
    let mut config = config::load(&discovery).context("Failed to load configuration")?;
    if let Some(url) = backend {
        config.backend_url = url;
    }
    Ok(config)
}

/// Load config and connect to the backend for commands that talk to it.
fn connect(backend: Option<String>) -> Result<(Arc<dyn Backend>, Config), i32> {
    let config = load_config(backend).map_err(|err| {
        eprintln!("error: {:#}", err);
        1
    })?;
    let backend = cli::connect(&config)?;
    Ok((backend, config))
}

fn run(args: Args) -> Result<(), i32> {
    match args.command {
        // Config commands report their own errors and must work without a
        // loadable config.
        Commands::Config { action } => match action {
            ConfigAction::Validate => cli::config::validate(),
            ConfigAction::Show => cli::config::show(),
        },
        Commands::Init(init_args) => cli::init::run(init_args),
        Commands::Search(search_args) => {
            let (backend, config) = connect(args.backend)?;
            cli::search::run(search_args, backend, config)
        }
        Commands::Dashboard(dashboard_args) => {
            let (backend, config) = connect(args.backend)?;
            cli::dashboard::run(dashboard_args, backend, &config)
        }
        Commands::Columns => {
            let (backend, _) = connect(args.backend)?;
            cli::lookup::columns(backend.as_ref())
        }
        Commands::Tags => {
            let (backend, _) = connect(args.backend)?;
            cli::lookup::tags(backend.as_ref())
        }
        Commands::Web(web_args) => {
            let (backend, config) = connect(args.backend)?;
            web::run(web_args, backend, config)
        }
    }
}

fn main() {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    if let Err(code) = run(args) {
        std::process::exit(code);
    }
}
