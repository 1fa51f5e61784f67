//! Directory walker built on `walkdir`.
//!
//! # Overview
//!
//! [`Walker`] yields every regular file below a root (or the root itself
//! when it is a file) together with its size. Entries are visited in file
//! name order so that the same tree always produces the same candidate
//! order. Symbolic links are never followed and never reported.
//!
//! Errors for individual entries are yielded as [`ScanError`] values and
//! do not stop the walk.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};

/// Sequential directory walker.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use blockdupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the tree, yielding file entries in a deterministic order.
    ///
    /// ```no_run
    /// use blockdupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && Self::is_hidden(entry)))
            .take_while(|_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileEntry, ScanError>> {
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }
        if !file_type.is_file() {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let size = metadata.len();
        if !self.config.accepts_size(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                entry.path().display()
            );
            return None;
        }

        Some(Ok(FileEntry::new(entry.path().to_path_buf(), size)))
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.io_error().map(io::Error::kind) {
            Some(io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(io::ErrorKind::NotFound) => {
                log::debug!("Entry vanished during walk: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                ScanError::Io {
                    path,
                    source: Arc::new(io::Error::other(error.to_string())),
                }
            }
        }
    }
}

/// Drop inputs that name the same tree as an earlier input or lie inside
/// another input.
///
/// Roots are compared by their canonical form, so `dir`, `./dir` and
/// `dir/sub/..` are one root. Surviving roots keep the spelling the user
/// gave and their original order. A root that cannot be canonicalized is
/// compared as written.
#[must_use]
pub fn distinct_roots(paths: &[PathBuf]) -> Vec<PathBuf> {
    let resolved: Vec<(PathBuf, PathBuf)> = paths
        .iter()
        .map(|path| {
            let canonical = path.canonicalize().unwrap_or_else(|e| {
                log::debug!("Cannot canonicalize {}: {}", path.display(), e);
                path.clone()
            });
            (path.clone(), canonical)
        })
        .collect();

    resolved
        .iter()
        .enumerate()
        .filter(|(i, (path, canonical))| {
            let covered = resolved.iter().enumerate().any(|(j, (_, other))| {
                if j == *i {
                    return false;
                }
                if canonical == other {
                    j < *i
                } else {
                    canonical.starts_with(other)
                }
            });
            if covered {
                log::info!("Skipping overlapping input path: {}", path.display());
            }
            !covered
        })
        .map(|(_, (path, _))| path.clone())
        .collect()
}
