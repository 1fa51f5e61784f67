//! Incremental block-wise comparison.
//!
//! # Overview
//!
//! Pending groups live in a work-list that is processed in rounds. In each
//! round every pending group reads its next block from every member,
//! advances a copy of its checkpoint per member and splits into children by
//! the resulting digest. Children that still hold two or more members and
//! have bytes left go back on the list for the next round; a child with one
//! member is unique, and a child that reached end-of-file is a duplicate
//! set.
//!
//! Before each round the [`ResourcePolicy`] is evaluated against the number
//! of live candidates, so the whole round uses one handle mode and one
//! block size.

use std::collections::VecDeque;

use super::groups::{CandidateGroup, GroupSplitter};
use super::policy::{HandleMode, ResourcePolicy};
use super::session::ComparisonSession;

impl ComparisonSession<'_> {
    /// Drive `groups` to completion, emitting every duplicate set found.
    pub(super) fn compare_incrementally(&mut self, groups: Vec<CandidateGroup>) {
        let mut pending = VecDeque::with_capacity(groups.len());
        for group in groups {
            self.settle(group, &mut pending);
        }

        let mut mode = None;
        while !pending.is_empty() {
            if self.shutdown_requested() {
                break;
            }

            let live: usize = pending.iter().map(CandidateGroup::len).sum();
            let policy = self.select_policy(live);
            if mode != Some(policy.mode) {
                log::debug!(
                    "Size-class {} bytes: {} live candidates, {} mode with {} byte blocks",
                    self.size,
                    live,
                    policy.mode,
                    policy.block_size
                );
                mode = Some(policy.mode);
            }

            self.stats.rounds += 1;
            match policy.mode {
                HandleMode::Open => self.stats.open_rounds += 1,
                HandleMode::Close => self.stats.closed_rounds += 1,
            }

            // Children pushed during this round wait for the next one.
            for _ in 0..pending.len() {
                let Some(group) = pending.pop_front() else {
                    break;
                };
                for child in self.advance_group(&group, policy) {
                    self.settle(child, &mut pending);
                }
            }
        }
    }

    /// Read the next block of every member and split by digest.
    fn advance_group(
        &mut self,
        group: &CandidateGroup,
        policy: ResourcePolicy,
    ) -> Vec<CandidateGroup> {
        let len = policy.block_size.min(self.size - group.offset);
        let mut splitter = GroupSplitter::new(group.offset + len);

        for &id in &group.members {
            match self.read_and_advance(id, group.offset, len, policy.mode, &group.checkpoint) {
                Ok(digest) => splitter.assign(id, digest),
                Err(error) => self.drop_member(id, error),
            }
        }

        let children = splitter.finish();
        if children.len() > 1 {
            log::trace!(
                "Group of {} split into {} at offset {}",
                group.len(),
                children.len(),
                group.offset + len
            );
        }
        children
    }

    /// Route a group to its next destination.
    fn settle(&mut self, group: CandidateGroup, pending: &mut VecDeque<CandidateGroup>) {
        if !group.is_contested() {
            self.retire(group);
        } else if group.is_complete(self.size) {
            self.emit(group);
        } else {
            pending.push_back(group);
        }
    }

    /// Policy for the coming round, downgraded when the budget is short.
    fn select_policy(&mut self, live: usize) -> ResourcePolicy {
        let wanted = ResourcePolicy::evaluate(live, self.config);
        match wanted.mode {
            HandleMode::Open if self.handles.enter_open_mode(live) => wanted,
            HandleMode::Open => {
                log::debug!(
                    "Size-class {} bytes: {} handles unavailable, reading in close mode",
                    self.size,
                    live
                );
                self.stats.downgraded_rounds += 1;
                ResourcePolicy::closed(self.config)
            }
            HandleMode::Close => {
                self.handles.enter_close_mode();
                wanted
            }
        }
    }
}
