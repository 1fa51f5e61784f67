//! Duplicate finder driving the engine over many size-classes.
//!
//! # Overview
//!
//! The finder runs the full pipeline:
//! 1. **Walk** - collect regular files below each input path
//! 2. **Size grouping** - keep only sizes shared by two or more files
//!    (see [`crate::duplicates::groups`])
//! 3. **Comparison** - resolve every size-class with its own
//!    [`ComparisonSession`], sequentially or on a `rayon` pool
//!
//! All sessions of one run draw on a single [`HandleBudget`], so the
//! open-file ceiling holds across parallel size-classes.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::{DuplicateFinder, EngineConfig, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_engine(EngineConfig::default().with_jobs(4));
//! let finder = DuplicateFinder::new(config);
//!
//! let (sets, summary) = finder.find_duplicates_in_paths(&[PathBuf::from(".")]).unwrap();
//! println!("{} duplicate sets, {} reclaimable", sets.len(), summary.reclaimable_display());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::engine::{EngineConfig, EngineConfigError};
use super::groups::{group_by_size, DuplicateSet, SizeClasses};
use super::handles::HandleBudget;
use super::session::{ComparisonSession, SizeClassOutcome};
use crate::progress::ProgressCallback;
use crate::scanner::{
    distinct_roots, FileEntry, HashError, ScanError, Walker, WalkerConfig,
};

/// Configuration for a [`DuplicateFinder`].
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Engine tuning
    pub engine: EngineConfig,
    /// Filters applied while walking
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("engine", &self.engine)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the engine configuration.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Size-classes with two or more files
    pub size_classes: usize,
    /// Files that entered comparison
    pub candidate_files: usize,
    /// Files eliminated because no other file had their size
    pub eliminated_by_size: usize,
    /// Files eliminated by quick-scan sampling
    pub eliminated_by_quick_scan: usize,
    /// Files proven unique by content comparison (quick-scan included)
    pub unique_files: usize,
    /// Files hashed start to finish on expensive media
    pub sequentially_hashed: usize,
    /// Incremental comparator rounds across all size-classes
    pub rounds: usize,
    /// Rounds that reopened handles for every block
    pub closed_rounds: usize,
    /// Bytes read during comparison
    pub bytes_read: u64,
    /// Confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Redundant copies (each set minus one file)
    pub duplicate_files: usize,
    /// Space taken by redundant copies
    pub reclaimable_space: u64,
    /// Highest number of handles open at once
    pub peak_open_handles: usize,
    /// Files dropped during comparison because they could not be read
    pub unreadable: Vec<HashError>,
    /// Errors encountered while walking
    pub scan_errors: Vec<ScanError>,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl ScanSummary {
    /// Percentage of the collected bytes taken by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// Format bytes read as human-readable string.
    #[must_use]
    pub fn bytes_read_display(&self) -> String {
        ByteSize::b(self.bytes_read).to_string()
    }

    /// Check whether any file could not be read or walked.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.unreadable.is_empty() || !self.scan_errors.is_empty()
    }

    fn absorb(&mut self, outcome: &SizeClassOutcome) {
        let stats = &outcome.stats;
        self.eliminated_by_quick_scan += stats.quick_scan_eliminated;
        self.unique_files += stats.unique_files;
        self.sequentially_hashed += stats.sequentially_hashed;
        self.rounds += stats.rounds;
        self.closed_rounds += stats.closed_rounds;
        self.bytes_read += stats.bytes_read;
        self.unreadable.extend(outcome.unreadable.iter().cloned());
        for set in &outcome.duplicates {
            self.duplicate_sets += 1;
            self.duplicate_files += set.duplicate_count();
            self.reclaimable_space += set.wasted_space();
        }
        self.interrupted |= outcome.interrupted;
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// An input path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The engine configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] EngineConfigError),

    /// An I/O error occurred outside of per-file comparison.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A scan error occurred.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Duplicate finder that orchestrates walking, size grouping and comparison.
///
/// # Example
///
/// ```no_run
/// use blockdupe::duplicates::DuplicateFinder;
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates_in_paths(&[PathBuf::from(".")]) {
///     Ok((sets, summary)) => {
///         println!("Found {} duplicate sets", sets.len());
///         println!("Can reclaim {}", summary.reclaimable_display());
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Walk `paths`, group by size and resolve every size-class.
    ///
    /// Every path must exist; files and directories may be mixed. Inputs
    /// that resolve to the same tree, or lie inside another input, are
    /// walked once (see [`distinct_roots`]), so no file is compared with
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - a path does not exist
    /// - the engine configuration is invalid
    /// - the scan is interrupted by shutdown signal
    pub fn find_duplicates_in_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        self.config.engine.validate()?;

        if let Some(missing) = paths.iter().find(|path| !path.exists()) {
            return Err(FinderError::PathNotFound(missing.clone()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {} path(s)", paths.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let roots = distinct_roots(paths);
        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for root in &roots {
            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }
            for result in walker.walk() {
                match result {
                    Ok(file) => {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(files.len() + 1, &file.path.to_string_lossy());
                        }
                        files.push(file);
                    }
                    Err(e) => scan_errors.push(e),
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }
        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted during walk");
            return Err(FinderError::Interrupted);
        }

        let (sets, mut summary) = self.find_duplicates_from_files(files)?;
        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();
        Ok((sets, summary))
    }

    /// Group already collected files by size and resolve every size-class.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the engine configuration is invalid or the
    /// scan is interrupted.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let (classes, grouping) = group_by_size(files);

        log::info!(
            "Collected {} files ({}), {} size-classes to compare",
            grouping.total_files,
            ByteSize::b(grouping.total_size),
            classes.len()
        );

        let (sets, mut summary) = self.find_in_size_classes(classes)?;
        summary.total_files = grouping.total_files;
        summary.total_size = grouping.total_size;
        summary.eliminated_by_size = grouping.eliminated_unique;
        summary.scan_duration = start_time.elapsed();
        Ok((sets, summary))
    }

    /// Resolve pre-grouped size-classes.
    ///
    /// Every path of a class must have that class's size. Results come back
    /// ordered by size, then by the order in which sets completed.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the engine configuration is invalid or the
    /// scan is interrupted.
    pub fn find_in_size_classes(
        &self,
        classes: SizeClasses,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let engine = &self.config.engine;
        engine.validate()?;

        let mut summary = ScanSummary {
            size_classes: classes.len(),
            candidate_files: classes.values().map(Vec::len).sum(),
            ..Default::default()
        };

        log::info!(
            "Comparing {} candidates in {} size-classes ({} job(s), {} media)",
            summary.candidate_files,
            summary.size_classes,
            engine.jobs,
            engine.media_seek_cost
        );
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("comparing", summary.size_classes);
        }

        let budget = HandleBudget::new(engine.max_open_handles);
        let outcomes = self.resolve_all(classes, &budget);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("comparing");
        }

        let mut sets = Vec::new();
        for outcome in outcomes {
            match outcome {
                Some(outcome) => {
                    summary.absorb(&outcome);
                    sets.extend(outcome.duplicates);
                }
                None => summary.interrupted = true,
            }
        }
        summary.peak_open_handles = budget.peak();
        summary.scan_duration = start_time.elapsed();

        if summary.interrupted {
            log::info!("Comparison interrupted after {} rounds", summary.rounds);
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} duplicate sets ({} redundant files, {} reclaimable), read {}",
            summary.duplicate_sets,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.bytes_read_display()
        );
        if !summary.unreadable.is_empty() {
            log::warn!("{} files could not be read", summary.unreadable.len());
        }

        Ok((sets, summary))
    }

    /// Resolve each class, returning `None` for classes skipped by shutdown.
    fn resolve_all(
        &self,
        classes: SizeClasses,
        budget: &HandleBudget,
    ) -> Vec<Option<SizeClassOutcome>> {
        let classes: Vec<(u64, Vec<PathBuf>)> = classes.into_iter().collect();
        let completed = AtomicUsize::new(0);

        let resolve_one = |(size, paths): (u64, Vec<PathBuf>)| {
            if self.config.is_shutdown_requested() {
                return None;
            }
            let mut session = ComparisonSession::new(size, paths, &self.config.engine, budget);
            if let Some(flag) = self.config.shutdown_flag.as_deref() {
                session = session.with_shutdown_flag(flag);
            }
            let outcome = session.resolve();

            if let Some(ref callback) = self.config.progress_callback {
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                callback.on_progress(done, &format!("{} byte files", size));
                callback.on_item_completed(outcome.stats.bytes_read);
            }
            Some(outcome)
        };

        let jobs = self.config.engine.jobs;
        if jobs <= 1 {
            return classes.into_iter().map(resolve_one).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| classes.into_par_iter().map(&resolve_one).collect()),
            Err(e) => {
                log::warn!("Failed to create thread pool ({}), comparing sequentially", e);
                classes.into_iter().map(resolve_one).collect()
            }
        }
    }
}
