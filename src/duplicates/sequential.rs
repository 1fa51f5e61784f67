//! Whole-file hashing for media that are expensive to seek.
//!
//! On rotational disks, interleaving one block from each of many files
//! costs a head movement per block. Instead every remaining candidate is
//! read start to finish in one pass and grouped by its final digest, which
//! produces terminal groups directly.

use super::digest::Digest;
use super::groups::{CandidateGroup, FileId, GroupSplitter};
use super::session::ComparisonSession;
use crate::scanner::HashError;

impl ComparisonSession<'_> {
    /// Replace every contested group by its children keyed on full-file digests.
    ///
    /// The children sit at offset `size` and are therefore complete.
    pub(super) fn hash_sequentially(&mut self, groups: Vec<CandidateGroup>) -> Vec<CandidateGroup> {
        let mut complete = Vec::with_capacity(groups.len());

        for group in groups {
            if !group.is_contested() || self.shutdown_requested() {
                complete.push(group);
                continue;
            }

            let mut splitter = GroupSplitter::new(self.size);
            for &id in &group.members {
                match self.hash_whole_file(id) {
                    Ok(digest) => splitter.assign(id, digest),
                    Err(error) => self.drop_member(id, error),
                }
            }
            complete.extend(splitter.finish());
        }

        complete
    }

    /// Hash all of `id` from a fresh digest in one sequential pass.
    fn hash_whole_file(&mut self, id: FileId) -> Result<Digest, HashError> {
        let path = &self.paths[id];
        let block_size = self.config.block_size as u64;
        let mut digest = Digest::new();

        self.handles
            .read_sequential(path, self.size, block_size, &mut self.buffer, |chunk| {
                digest.update(chunk);
            })
            .map_err(|e| HashError::from_io(path, e))?;

        log::trace!("Hashed {} sequentially", path.display());
        self.stats.bytes_read += self.size;
        self.stats.sequentially_hashed += 1;
        Ok(digest)
    }
}
