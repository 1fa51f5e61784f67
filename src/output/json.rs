//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "digest": "af1349b9...",
//!       "size": 1024,
//!       "files": ["/data/a.bin", "/backup/a.bin"]
//!     }
//!   ],
//!   "unreadable": ["/data/locked.bin"],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_sets": 5,
//!     "bytes_read": 4194304,
//!     "exit_code": 0,
//!     "exit_code_name": "BD000"
//!   }
//! }
//! ```
//!
//! The summary holds more counters than shown; see [`JsonSummary`].

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateSet, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate set in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateSet {
    /// Engine fingerprint as hexadecimal string (64 characters)
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Member paths in input order
    pub files: Vec<String>,
}

impl From<&DuplicateSet> for JsonDuplicateSet {
    fn from(set: &DuplicateSet) -> Self {
        Self {
            digest: set.fingerprint_hex(),
            size: set.size,
            files: set
                .paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Files that entered comparison
    pub candidate_files: usize,
    /// Files eliminated by size alone
    pub eliminated_by_size: usize,
    /// Files eliminated by quick-scan sampling
    pub eliminated_by_quick_scan: usize,
    /// Files hashed sequentially
    pub sequentially_hashed: usize,
    /// Incremental comparator rounds
    pub rounds: usize,
    /// Bytes read during comparison
    pub bytes_read: u64,
    /// Confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Redundant copies
    pub duplicate_files: usize,
    /// Bytes taken by redundant copies
    pub reclaimable_space: u64,
    /// Highest number of simultaneously open files
    pub peak_open_handles: usize,
    /// Errors while walking
    pub scan_errors: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "BD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            candidate_files: summary.candidate_files,
            eliminated_by_size: summary.eliminated_by_size,
            eliminated_by_quick_scan: summary.eliminated_by_quick_scan,
            sequentially_hashed: summary.sequentially_hashed,
            rounds: summary.rounds,
            bytes_read: summary.bytes_read,
            duplicate_sets: summary.duplicate_sets,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            peak_open_handles: summary.peak_open_handles,
            scan_errors: summary.scan_errors.len(),
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Confirmed duplicate sets
    pub duplicates: Vec<JsonDuplicateSet>,
    /// Files skipped because they could not be read
    pub unreadable: Vec<String>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate sets, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use blockdupe::duplicates::{Digest, DuplicateSet, ScanSummary};
    /// use blockdupe::error::ExitCode;
    /// use blockdupe::output::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let sets = vec![DuplicateSet::new(
    ///     3,
    ///     Digest::new().advanced(b"abc").value(),
    ///     vec![PathBuf::from("/a"), PathBuf::from("/b")],
    /// )];
    /// let output = JsonOutput::new(&sets, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates[0].files, vec!["/a", "/b"]);
    /// ```
    #[must_use]
    pub fn new(sets: &[DuplicateSet], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: sets.iter().map(JsonDuplicateSet::from).collect(),
            unreadable: summary
                .unreadable
                .iter()
                .map(|e| e.path().to_string_lossy().into_owned())
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON and a trailing newline to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}
