//! Resolution of one size-class.
//!
//! # Overview
//!
//! A [`ComparisonSession`] owns everything needed to turn one list of
//! equal-sized paths into duplicate sets: the candidate groups, a
//! [`HandleTable`] and a read buffer. Nothing in it is shared with other
//! sessions except the [`HandleBudget`], so independent size-classes can be
//! resolved on different threads.
//!
//! The stages run in a fixed order:
//!
//! 1. quick-scan, for files above the configured threshold
//! 2. whole-file hashing, when the medium is expensive to seek
//! 3. the incremental block comparator, for whatever is still contested
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::{ComparisonSession, EngineConfig, HandleBudget};
//! use std::path::PathBuf;
//!
//! let config = EngineConfig::default();
//! let budget = HandleBudget::new(config.max_open_handles);
//! let paths = vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")];
//!
//! let outcome = ComparisonSession::new(4096, paths, &config, &budget).resolve();
//! for set in &outcome.duplicates {
//!     println!("{:?}", set.paths);
//! }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use super::digest::Digest;
use super::engine::{EngineConfig, MediaSeekCost};
use super::groups::{CandidateGroup, DuplicateSet, FileId};
use super::handles::{HandleBudget, HandleTable};
use super::policy::HandleMode;
use crate::scanner::HashError;

/// Counters collected while resolving one size-class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Paths handed to the session
    pub candidates: usize,
    /// Incremental comparator rounds
    pub rounds: usize,
    /// Rounds that kept handles open
    pub open_rounds: usize,
    /// Rounds that reopened handles per block
    pub closed_rounds: usize,
    /// Open rounds downgraded because the shared budget was exhausted
    pub downgraded_rounds: usize,
    /// Bytes read across every stage
    pub bytes_read: u64,
    /// Files proven unique by quick-scan
    pub quick_scan_eliminated: usize,
    /// Files hashed start to finish
    pub sequentially_hashed: usize,
    /// Files proven unique by any stage
    pub unique_files: usize,
    /// Files dropped because they could not be read
    pub unreadable_files: usize,
}

/// Result of resolving one size-class.
#[derive(Debug, Clone)]
pub struct SizeClassOutcome {
    /// Shared file size
    pub size: u64,
    /// Confirmed duplicate sets, in the order they completed
    pub duplicates: Vec<DuplicateSet>,
    /// Files dropped from comparison
    pub unreadable: Vec<HashError>,
    /// Counters
    pub stats: SessionStats,
    /// Whether a shutdown request cut the session short
    pub interrupted: bool,
}

/// Owned engine state for one size-class.
pub struct ComparisonSession<'a> {
    pub(super) size: u64,
    pub(super) paths: Vec<PathBuf>,
    pub(super) config: &'a EngineConfig,
    pub(super) handles: HandleTable<'a>,
    pub(super) buffer: Vec<u8>,
    pub(super) stats: SessionStats,
    shutdown: Option<&'a AtomicBool>,
    duplicates: Vec<DuplicateSet>,
    unreadable: Vec<HashError>,
    interrupted: bool,
}

impl<'a> ComparisonSession<'a> {
    /// Create a session for `paths`, all of which are `size` bytes long.
    ///
    /// `paths` must not contain the same file twice.
    #[must_use]
    pub fn new(
        size: u64,
        paths: Vec<PathBuf>,
        config: &'a EngineConfig,
        budget: &'a HandleBudget,
    ) -> Self {
        Self {
            size,
            paths,
            config,
            handles: HandleTable::new(budget),
            buffer: Vec::new(),
            stats: SessionStats::default(),
            shutdown: None,
            duplicates: Vec::new(),
            unreadable: Vec::new(),
            interrupted: false,
        }
    }

    /// Stop between rounds once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Run every applicable stage and return what was found.
    pub fn resolve(mut self) -> SizeClassOutcome {
        self.stats.candidates = self.paths.len();
        log::debug!(
            "Resolving size-class {} bytes with {} candidates",
            self.size,
            self.paths.len()
        );

        let mut groups = vec![CandidateGroup::root((0..self.paths.len()).collect())];

        if self.config.quick_scan_applies(self.size) {
            groups = self.quick_scan(groups);
        }
        if self.config.media_seek_cost == MediaSeekCost::Expensive {
            groups = self.hash_sequentially(groups);
        }
        self.compare_incrementally(groups);
        self.handles.close_all();

        log::debug!(
            "Size-class {} bytes: {} duplicate sets, {} unique, {} unreadable, {} rounds",
            self.size,
            self.duplicates.len(),
            self.stats.unique_files,
            self.stats.unreadable_files,
            self.stats.rounds
        );

        SizeClassOutcome {
            size: self.size,
            duplicates: self.duplicates,
            unreadable: self.unreadable,
            stats: self.stats,
            interrupted: self.interrupted,
        }
    }

    /// Check the shutdown flag, remembering a positive answer.
    pub(super) fn shutdown_requested(&mut self) -> bool {
        if !self.interrupted
            && self
                .shutdown
                .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            log::debug!("Size-class {} bytes: shutdown requested", self.size);
            self.interrupted = true;
        }
        self.interrupted
    }

    /// Read `len` bytes of `id` at `offset` and advance `checkpoint` with them.
    pub(super) fn read_and_advance(
        &mut self,
        id: FileId,
        offset: u64,
        len: u64,
        mode: HandleMode,
        checkpoint: &Digest,
    ) -> Result<Digest, HashError> {
        let path = &self.paths[id];
        let result = match mode {
            HandleMode::Open => self
                .handles
                .read_open(id, path, offset, len, &mut self.buffer),
            HandleMode::Close => self.handles.read_closed(path, offset, len, &mut self.buffer),
        };
        result.map_err(|e| HashError::from_io(path, e))?;

        self.stats.bytes_read += len;
        Ok(checkpoint.advanced(&self.buffer))
    }

    /// Remove an unreadable file from every further comparison.
    pub(super) fn drop_member(&mut self, id: FileId, error: HashError) {
        log::warn!("Skipping unreadable file: {}", error);
        self.handles.close(id);
        self.stats.unreadable_files += 1;
        self.unreadable.push(error);
    }

    /// File-level exit for a group left with at most one member.
    pub(super) fn retire(&mut self, group: CandidateGroup) {
        for &id in &group.members {
            log::trace!("Unique at offset {}: {}", group.offset, self.paths[id].display());
            self.handles.close(id);
            self.stats.unique_files += 1;
        }
    }

    /// Record a group that reached end-of-file with two or more members.
    pub(super) fn emit(&mut self, group: CandidateGroup) {
        for &id in &group.members {
            self.handles.close(id);
        }
        let paths = group
            .members
            .iter()
            .map(|&id| self.paths[id].clone())
            .collect();
        let set = DuplicateSet::new(self.size, group.checkpoint.value(), paths);
        log::trace!("Duplicate set of {} files ({})", set.len(), set.fingerprint);
        self.duplicates.push(set);
    }
}
