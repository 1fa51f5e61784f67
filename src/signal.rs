//! Ctrl+C handling for graceful shutdown.
//!
//! A single `AtomicBool` is set when SIGINT (or SIGTERM, via the `ctrlc`
//! `termination` feature) arrives. The walker stops yielding entries and
//! comparison sessions stop between rounds once they see it; the run then
//! ends with [`crate::duplicates::FinderError::Interrupted`] and exit code
//! 130.
//!
//! ```rust,no_run
//! use blockdupe::duplicates::FinderConfig;
//! use blockdupe::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown as if Ctrl+C had been pressed.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to the finder.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The OS handler can only be registered once per process; later calls
/// (several runs in one test binary) get the same handler back with its
/// flag cleared.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS handler cannot be set.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.flag();
    let result = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current round...");
        log::info!("Shutdown signal received");
    });

    match result {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            // Another thread won the race; reuse its handler when available.
            log::debug!("Signal handler already registered");
            Ok(GLOBAL_HANDLER.get().cloned().unwrap_or(handler))
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_starts_clear() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_visible_through_flag() {
        let handler = ShutdownHandler::new();
        let flag = handler.flag();
        handler.request_shutdown();
        assert!(flag.load(Ordering::SeqCst));
        assert!(handler.clone().is_shutdown_requested());
    }

    #[test]
    fn test_install_twice_returns_shared_handler() {
        let first = install_handler().unwrap();
        let second = install_handler().unwrap();
        assert!(Arc::ptr_eq(&first.flag, &second.flag));
        assert!(!second.is_shutdown_requested());
    }
}
