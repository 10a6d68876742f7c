use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "TAMANDUA_LOG";

const DEFAULT_FILTER: &str = "tamandua_web=info";
const VERBOSE_FILTER: &str = "tamandua_web=debug";

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_FILTER);
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
