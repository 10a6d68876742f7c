//! Shutdown signal handling for the web server loop.
//!
//! The first SIGINT/SIGTERM sets a flag the server loop polls between
//! requests. A second signal exits immediately with code 1.

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Flag raised by the first termination signal.
#[derive(Clone, Debug)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

pub fn setup_shutdown_handlers() -> Result<ShutdownFlag, std::io::Error> {
    let term_now = Arc::new(AtomicBool::new(false));

    for sig in TERM_SIGNALS {
        // Armed only once term_now is true, i.e. on the second signal.
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&term_now))?;
        flag::register(*sig, Arc::clone(&term_now))?;
    }

    Ok(ShutdownFlag(term_now))
}
