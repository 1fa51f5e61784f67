//! Output formatters for duplicate scan results.
//!
//! - text: one line per set, paths joined by commas
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::DuplicateFinder;
//! use blockdupe::error::ExitCode;
//! use blockdupe::output::JsonOutput;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (sets, summary) = finder.find_duplicates_in_paths(&[PathBuf::from(".")]).unwrap();
//!
//! let output = JsonOutput::new(&sets, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::{write_summary, TextOutput};
