//! File discovery feeding the comparison engine.
//!
//! This module provides:
//! - Directory walking with `walkdir` ([`walker`])
//! - Storage medium detection for choosing the read strategy ([`media`])
//! - The error types shared by discovery and comparison
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod media;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use media::detect_seek_cost;
pub use walker::{distinct_roots, Walker};

/// A discovered regular file and its size at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path as reached from the scanned root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Filters applied while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Skip zero-length files.
    pub skip_empty: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,
}

impl WalkerConfig {
    /// Check whether a file of `size` bytes passes the size filters.
    #[must_use]
    pub fn accepts_size(&self, size: u64) -> bool {
        if self.skip_empty && size == 0 {
            return false;
        }
        if self.min_size.is_some_and(|min| size < min) {
            return false;
        }
        !self.max_size.is_some_and(|max| size > max)
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },
}

/// A file that could not be read while being compared.
///
/// The file is dropped from its group and takes no further part in the
/// comparison; the run itself continues.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The file vanished after it was collected.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file ended before its collected size.
    #[error("File shrank during comparison: {0}")]
    Truncated(PathBuf),

    /// Any other I/O failure while opening, seeking or reading.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::UnexpectedEof => Self::Truncated(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(err),
            },
        }
    }

    /// Path of the file that could not be read.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) | Self::Truncated(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
