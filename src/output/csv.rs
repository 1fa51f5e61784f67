//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each member of each duplicate set.
//!
//! # Columns
//!
//! - `set_id`: 1-based number of the duplicate set
//! - `digest`: engine fingerprint (hexadecimal)
//! - `size`: file size in bytes
//! - `path`: member path as collected

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateSet;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    set_id: usize,
    digest: &'a str,
    size: u64,
    path: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    sets: &'a [DuplicateSet],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(sets: &'a [DuplicateSet]) -> Self {
        Self { sets }
    }

    /// Write the CSV output, header included, to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.sets.is_empty() {
            csv_writer.write_record(["set_id", "digest", "size", "path"])?;
        }

        for (idx, set) in self.sets.iter().enumerate() {
            let digest = set.fingerprint_hex();
            for path in &set.paths {
                csv_writer.serialize(CsvRow {
                    set_id: idx + 1,
                    digest: &digest,
                    size: set.size,
                    path: path.to_string_lossy().into_owned(),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::Digest;
    use std::path::PathBuf;

    #[test]
    fn test_csv_rows_per_member() {
        let sets = vec![
            DuplicateSet::new(
                2,
                Digest::new().advanced(b"ab").value(),
                vec![PathBuf::from("/a"), PathBuf::from("/b")],
            ),
            DuplicateSet::new(
                1,
                Digest::new().advanced(b"c").value(),
                vec![
                    PathBuf::from("/c1"),
                    PathBuf::from("/c2"),
                    PathBuf::from("/with,comma"),
                ],
            ),
        ];

        let csv = CsvOutput::new(&sets).to_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "set_id,digest,size,path");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("1,"));
        assert!(lines[1].ends_with(",2,/a"));
        assert!(lines[5].starts_with("2,"));
        assert!(lines[5].ends_with(",1,\"/with,comma\""));
    }

    #[test]
    fn test_csv_empty_has_header() {
        let csv = CsvOutput::new(&[]).to_string().unwrap();
        assert_eq!(csv, "set_id,digest,size,path\n");
    }
}
