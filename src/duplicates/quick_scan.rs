//! Sparse pre-elimination for large files.
//!
//! Before committing to a full pass over a size-class of large files, a
//! handful of widely spaced blocks is read from every candidate: the head,
//! the tail and a fixed number of interior points. Files that disagree on
//! any sample cannot be duplicates and are dropped without reading the rest
//! of them.
//!
//! Samples are chained: each one advances the checkpoint left by the
//! previous sample, so members of a surviving group share an identical
//! sample history. The head sample is always first, which lets survivors
//! continue the full comparison right after the first block instead of
//! reading it again.

use std::collections::BTreeSet;

use super::groups::{CandidateGroup, GroupSplitter};
use super::policy::HandleMode;
use super::session::ComparisonSession;

/// Offsets sampled for a file of `size` bytes, smallest first.
///
/// Always contains 0 and `size - block_size` (saturating), plus `samples`
/// interior points spread evenly and aligned down to a block boundary.
/// Duplicates collapse, so small files yield fewer offsets.
///
/// # Example
///
/// ```
/// use blockdupe::duplicates::sample_offsets;
///
/// let offsets = sample_offsets(1000, 100, 3);
/// assert_eq!(offsets, vec![0, 200, 500, 700, 900]);
/// ```
#[must_use]
pub fn sample_offsets(size: u64, block_size: u64, samples: usize) -> Vec<u64> {
    if size == 0 {
        return Vec::new();
    }
    let block_size = block_size.max(1);
    let mut offsets = BTreeSet::from([0, size.saturating_sub(block_size)]);

    let slots = samples as u128 + 1;
    for i in 1..=samples as u128 {
        let point = (i * u128::from(size) / slots) as u64;
        offsets.insert(point / block_size * block_size);
    }

    offsets.into_iter().filter(|&offset| offset < size).collect()
}

impl ComparisonSession<'_> {
    /// Split `groups` by sampled blocks, returning the contested survivors.
    ///
    /// Survivors sit at offset `min(block_size, size)` with their chained
    /// checkpoint.
    pub(super) fn quick_scan(&mut self, groups: Vec<CandidateGroup>) -> Vec<CandidateGroup> {
        let block_size = self.config.block_size as u64;
        let offsets = sample_offsets(self.size, block_size, self.config.quick_scan_samples);
        let handoff = block_size.min(self.size);
        let unique_before = self.stats.unique_files;

        log::debug!(
            "Quick-scan of {} files ({} bytes) at {} offsets",
            self.paths.len(),
            self.size,
            offsets.len()
        );

        let mut groups = groups;
        for offset in offsets {
            if groups.is_empty() || self.shutdown_requested() {
                break;
            }
            let len = block_size.min(self.size - offset);

            let mut survivors = Vec::with_capacity(groups.len());
            for group in groups {
                let mut splitter = GroupSplitter::new(handoff);
                for &id in &group.members {
                    let sample =
                        self.read_and_advance(id, offset, len, HandleMode::Close, &group.checkpoint);
                    match sample {
                        Ok(digest) => splitter.assign(id, digest),
                        Err(error) => self.drop_member(id, error),
                    }
                }
                for child in splitter.finish() {
                    if child.is_contested() {
                        survivors.push(child);
                    } else {
                        self.retire(child);
                    }
                }
            }
            groups = survivors;
        }

        self.stats.quick_scan_eliminated += self.stats.unique_files - unique_before;
        log::debug!(
            "Quick-scan eliminated {} files, {} groups remain",
            self.stats.quick_scan_eliminated,
            groups.len()
        );
        groups
    }
}
