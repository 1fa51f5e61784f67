//! Size-classes, candidate groups and confirmed duplicate sets.
//!
//! # Overview
//!
//! Grouping happens at two levels:
//!
//! - **Size-classes** ([`group_by_size`]): files are bucketed by exact byte
//!   size, since files of different sizes cannot be duplicates. Only classes
//!   with two or more members are handed to the engine.
//! - **Candidate groups** ([`CandidateGroup`]): inside one size-class, the
//!   members still believed identical over the bytes read so far. A group is
//!   split by [`GroupSplitter`] each time another block is read.
//!
//! Member order is always the order in which files were first seen, so the
//! same input produces the same [`DuplicateSet`]s in the same order.
//!
//! # Example
//!
//! ```
//! use blockdupe::scanner::FileEntry;
//! use blockdupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (classes, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(classes.len(), 1);
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use super::digest::{Digest, DigestValue};
use crate::scanner::FileEntry;

/// Size-classes keyed by exact byte size, each an ordered list of paths.
pub type SizeClasses = BTreeMap<u64, Vec<PathBuf>>;

/// Index of a file within the size-class currently being compared.
pub type FileId = usize;

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of distinct files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in classes of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton classes)
    pub eliminated_unique: usize,
    /// Number of empty files encountered
    pub empty_files: usize,
    /// Number of paths seen more than once in the input
    pub repeated_paths: usize,
    /// Number of size-classes with 2+ files
    pub duplicate_classes: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by exact size.
///
/// Paths keep their first-seen order inside each class and a path listed
/// twice (e.g. two overlapping roots) is only kept once. Classes with a
/// single member are dropped.
///
/// # Example
///
/// ```
/// use blockdupe::scanner::FileEntry;
/// use blockdupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (classes, stats) = group_by_size(files);
///
/// assert_eq!(classes[&100], vec![PathBuf::from("/a.txt"), PathBuf::from("/b.txt")]);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileEntry>) -> (SizeClasses, GroupingStats) {
    let mut all_classes: SizeClasses = BTreeMap::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut stats = GroupingStats::default();

    for file in files {
        if !seen.insert(file.path.clone()) {
            stats.repeated_paths += 1;
            log::trace!("Ignoring repeated path {}", file.path.display());
            continue;
        }

        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }

        all_classes.entry(file.size).or_default().push(file.path);
    }

    stats.unique_sizes = all_classes.len();

    let filtered: SizeClasses = all_classes
        .into_iter()
        .filter(|(size, paths)| {
            if paths.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, paths[0].display());
                false
            } else {
                stats.potential_duplicates += paths.len();
                stats.duplicate_classes += 1;
                log::debug!("Size class {} bytes: {} candidates", size, paths.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping complete: {} files → {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered, stats)
}

/// Files of one size-class believed identical over `[0, offset)`.
///
/// All members produced the same digest for the bytes consumed so far;
/// `checkpoint` is that shared accumulator state.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    /// Bytes consumed so far (the next block starts here)
    pub offset: u64,
    /// Accumulator state shared by every member
    pub checkpoint: Digest,
    /// Members in first-seen order
    pub members: Vec<FileId>,
}

impl CandidateGroup {
    /// Root group of a size-class: every member, nothing read yet.
    #[must_use]
    pub fn root(members: Vec<FileId>) -> Self {
        Self {
            offset: 0,
            checkpoint: Digest::new(),
            members,
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check whether the group has no members left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check whether the group could still contain duplicates.
    #[must_use]
    pub fn is_contested(&self) -> bool {
        self.members.len() > 1
    }

    /// Check whether every byte of a file of `size` bytes has been consumed.
    #[must_use]
    pub fn is_complete(&self, size: u64) -> bool {
        self.offset >= size
    }
}

/// Re-partitions one parent group by the digest each member produced.
///
/// Children come out in the order their digest was first seen, and members
/// keep their relative order inside each child.
#[derive(Debug)]
pub struct GroupSplitter {
    next_offset: u64,
    index: HashMap<DigestValue, usize>,
    children: Vec<CandidateGroup>,
}

impl GroupSplitter {
    /// Start splitting a parent whose children will sit at `next_offset`.
    #[must_use]
    pub fn new(next_offset: u64) -> Self {
        Self {
            next_offset,
            index: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// File `id` produced `digest` after the latest block.
    pub fn assign(&mut self, id: FileId, digest: Digest) {
        let key = digest.value();
        match self.index.get(&key) {
            Some(&slot) => self.children[slot].members.push(id),
            None => {
                self.index.insert(key, self.children.len());
                self.children.push(CandidateGroup {
                    offset: self.next_offset,
                    checkpoint: digest,
                    members: vec![id],
                });
            }
        }
    }

    /// Finish splitting and return the children.
    #[must_use]
    pub fn finish(self) -> Vec<CandidateGroup> {
        self.children
    }
}

/// A confirmed set of byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    /// File size in bytes (shared by every member)
    pub size: u64,
    /// Engine fingerprint of the content.
    ///
    /// Includes any quick-scan samples, so it is only comparable between
    /// sets found with the same settings.
    pub fingerprint: DigestValue,
    /// Member paths in input order
    pub paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Create a new duplicate set.
    #[must_use]
    pub fn new(size: u64, fingerprint: DigestValue, paths: Vec<PathBuf>) -> Self {
        debug_assert!(paths.len() > 1, "a duplicate set needs two members");
        Self {
            size,
            fingerprint,
            paths,
        }
    }

    /// Number of files in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Space taken by the redundant copies.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Fingerprint as hexadecimal string.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint.to_hex()
    }
}
