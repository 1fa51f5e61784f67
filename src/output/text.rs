//! Plain-text output: one line per duplicate set, paths joined by commas.
//!
//! ```text
//! /photos/a.jpg,/backup/a.jpg
//! /music/x.flac,/music/copy of x.flac,/old/x.flac
//! ```

use std::io::{self, Write};

use crate::duplicates::{DuplicateSet, ScanSummary};

/// Plain-text formatter.
pub struct TextOutput<'a> {
    sets: &'a [DuplicateSet],
}

impl<'a> TextOutput<'a> {
    /// Create a new text formatter.
    #[must_use]
    pub fn new(sets: &'a [DuplicateSet]) -> Self {
        Self { sets }
    }

    /// Write one line per set.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for set in self.sets {
            let line = set
                .paths
                .iter()
                .map(|p| p.to_string_lossy())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(writer, "{line}")?;
        }
        writer.flush()
    }
}

/// Write a short human-readable summary, meant for stderr.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_summary<W: Write>(summary: &ScanSummary, mut writer: W) -> io::Result<()> {
    writeln!(
        writer,
        "{} files ({}), {} duplicate sets, {} redundant files, {} reclaimable",
        summary.total_files,
        summary.total_size_display(),
        summary.duplicate_sets,
        summary.duplicate_files,
        summary.reclaimable_display()
    )?;
    writeln!(
        writer,
        "Read {} in {} rounds ({} files hashed sequentially) in {:.2?}",
        summary.bytes_read_display(),
        summary.rounds,
        summary.sequentially_hashed,
        summary.scan_duration
    )?;
    if !summary.unreadable.is_empty() {
        writeln!(writer, "{} files could not be read:", summary.unreadable.len())?;
        for error in &summary.unreadable {
            writeln!(writer, "  {}", error)?;
        }
    }
    Ok(())
}
