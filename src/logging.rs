//! Logging setup for blockdupe.
//!
//! Logging goes through the `log` facade with an `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (warnings and errors) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Warnings stay visible under `--quiet`; unreadable files are reported at
//! warning level.
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: timestamp and level, plus the module path when verbose
//! - **Release builds**: level and message only
//!
//! # Example
//!
//! ```rust,no_run
//! use blockdupe::logging::init_logging;
//!
//! // -v on the command line
//! init_logging(1, false);
//! log::debug!("Resolving size-class");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem from CLI verbosity flags.
///
/// Returns `false` if a logger was already installed (for example by a
/// test harness); the existing logger is kept.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only warnings and errors (overridden by RUST_LOG)
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let use_env = env::var("RUST_LOG").is_ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level);
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return false;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!("Logging initialized at level: {:?}", level);
    }
    true
}

/// Map CLI flags to a level filter.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}
