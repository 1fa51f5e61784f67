//! Storage medium detection.
//!
//! Maps the disk holding a path to a [`MediaSeekCost`] using `sysinfo`'s
//! disk kind. Rotational disks report [`DiskKind::HDD`] and get the
//! sequential whole-file strategy; everything else is treated as cheap to
//! seek.

use std::path::Path;

use sysinfo::{DiskKind, Disks};

use crate::duplicates::MediaSeekCost;

/// Detect the seek cost of the disk that holds `path`.
///
/// Returns `None` when the path cannot be resolved or the disk kind is
/// unknown (network shares, containers, some virtual disks).
#[must_use]
pub fn detect_seek_cost(path: &Path) -> Option<MediaSeekCost> {
    let canonical = path.canonicalize().ok()?;
    let disks = Disks::new_with_refreshed_list();

    // Longest mount point wins so `/home` beats `/`.
    let disk = disks
        .list()
        .iter()
        .filter(|disk| canonical.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())?;

    let cost = seek_cost_for(disk.kind());
    log::debug!(
        "{} is on {} ({:?}): seek cost {:?}",
        canonical.display(),
        disk.mount_point().display(),
        disk.kind(),
        cost
    );
    cost
}

fn seek_cost_for(kind: DiskKind) -> Option<MediaSeekCost> {
    match kind {
        DiskKind::HDD => Some(MediaSeekCost::Expensive),
        DiskKind::SSD => Some(MediaSeekCost::Cheap),
        DiskKind::Unknown(_) => None,
    }
}
