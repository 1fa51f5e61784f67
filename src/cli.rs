//! Command-line interface definitions for blockdupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, config file, error format) apply to every subcommand.
//!
//! Engine options are all optional here: a value left unset falls back to
//! the config file, then the environment, then the built-in default (see
//! [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Report duplicates below two directories
//! blockdupe scan ~/Photos /mnt/backup/Photos
//!
//! # Spinning disk, few open files, JSON for scripting
//! blockdupe scan /srv/archive --media expensive --max-open-files 64 --output json
//!
//! # Bigger blocks, four size-classes at a time
//! blockdupe -v scan ~/data --block-size 1MiB --jobs 4
//!
//! # Show the settings a scan would use
//! blockdupe config
//! ```

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Incremental block-wise duplicate file detector.
///
/// blockdupe reads equal-sized files side by side, one block at a time, and
/// stops reading a file as soon as it differs from every other candidate.
/// It only reports duplicates; it never modifies the filesystem.
#[derive(Debug, Parser)]
#[command(name = "blockdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for blockdupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan files and directories for duplicate files
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Files or directories to scan
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Seek cost of the storage holding the files
    #[arg(long, value_enum)]
    pub media: Option<MediaArg>,

    /// Bytes read per file per round (e.g., 64KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub block_size: Option<u64>,

    /// Maximum number of files open at the same time
    #[arg(long, value_name = "N")]
    pub max_open_files: Option<usize>,

    /// Files larger than this get a sampling pass first; 0 disables it
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub quick_scan_threshold: Option<u64>,

    /// Interior offsets sampled by the quick-scan pass
    #[arg(long, value_name = "N")]
    pub quick_scan_samples: Option<usize>,

    /// Block multiplier while more files are live than may be open
    #[arg(long, value_name = "N")]
    pub chunk_factor: Option<usize>,

    /// Number of size-classes compared in parallel
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Minimum file size to consider (e.g., 1KB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1GB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Ignore zero-length files
    #[arg(long)]
    pub skip_empty: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Print the built-in defaults, ignoring files and environment
    #[arg(long)]
    pub defaults: bool,
}

/// Storage medium selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaArg {
    /// Detect from the disk holding the first path
    #[default]
    Auto,
    /// Solid-state or other storage with cheap seeks
    Cheap,
    /// Rotational storage; hash each file in one sequential pass
    Expensive,
}

impl std::fmt::Display for MediaArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaArg::Auto => write!(f, "auto"),
            MediaArg::Cheap => write!(f, "cheap"),
            MediaArg::Expensive => write!(f, "expensive"),
        }
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per duplicate set, paths separated by commas
    Text,
    /// JSON output for scripting
    Json,
    /// CSV output for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts whatever [`ByteSize`] parses: decimal (`KB`, `MB`, ...) and
/// binary (`KiB`, `MiB`, ...) units, case-insensitive, with an optional
/// fraction. A bare number is a byte count.
///
/// # Examples
///
/// ```
/// use blockdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, is not a number or has an
/// unknown unit.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
