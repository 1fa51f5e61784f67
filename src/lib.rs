//! blockdupe - Incremental block-wise duplicate file detector
//!
//! Files of equal size are read side by side, one block at a time, and a
//! file drops out as soon as its content diverges from every other
//! candidate. Each surviving group carries a BLAKE3 checkpoint of the bytes
//! read so far, so a block is never hashed twice for the same group.
//!
//! The engine lives in [`duplicates`]; [`run_app`] wires it to the command
//! line.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, ConfigArgs, OutputFormat, ScanArgs};
use crate::config::{Settings, SettingsOverrides};
use crate::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::{write_summary, CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for bad paths, invalid configuration, interrupted scans
/// and output failures. Use [`ExitCode::for_error`] to map it to a process
/// exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args),
        Commands::Config(ref args) => run_config(&cli, args),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler()?;

    let overrides = SettingsOverrides::from(args);
    let settings = Settings::load(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;
    let engine = settings.engine_config(args.paths.first().map(|p| p.as_path()))?;

    let mut finder_config = FinderConfig::default()
        .with_engine(engine)
        .with_walker_config(settings.walker_config())
        .with_shutdown_flag(handler.flag());

    let show_progress =
        args.output == OutputFormat::Text && !cli.quiet && io::stderr().is_terminal();
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (sets, summary) = finder.find_duplicates_in_paths(&args.paths)?;

    for error in &summary.scan_errors {
        log::warn!("{}", error);
    }

    let exit_code = exit_code_for(&sets, &summary);
    write_results(args.output, &sets, &summary, exit_code, cli.quiet)?;
    Ok(exit_code)
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> anyhow::Result<ExitCode> {
    let settings = if args.defaults {
        Settings::default()
    } else {
        Settings::load(cli.config.as_deref(), &SettingsOverrides::default())
            .context("Failed to load configuration")?
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(settings.to_toml()?.as_bytes())?;
    stdout.flush()?;
    Ok(ExitCode::Success)
}

/// Exit code for a completed scan.
#[must_use]
pub fn exit_code_for(sets: &[DuplicateSet], summary: &ScanSummary) -> ExitCode {
    if !summary.unreadable.is_empty() {
        ExitCode::PartialSuccess
    } else if sets.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}

fn write_results(
    format: OutputFormat,
    sets: &[DuplicateSet],
    summary: &ScanSummary,
    exit_code: ExitCode,
    quiet: bool,
) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => {
            TextOutput::new(sets).write_to(stdout)?;
            if !quiet {
                write_summary(summary, io::stderr().lock())?;
            }
        }
        OutputFormat::Json => JsonOutput::new(sets, summary, exit_code).write_to(stdout)?,
        OutputFormat::Csv => CsvOutput::new(sets).write_to(stdout)?,
    }
    Ok(())
}
