use blockdupe::duplicates::{sample_offsets, DuplicateFinder, EngineConfig, FinderConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SIZE: usize = 64 * 1024;
const BLOCK: usize = 4096;

fn engine() -> EngineConfig {
    EngineConfig::default()
        .with_block_size(BLOCK)
        .with_quick_scan_threshold(1024)
        .with_quick_scan_samples(4)
}

fn write_variants(dir: &Path, flip: Option<usize>) -> Vec<PathBuf> {
    let base: Vec<u8> = (0..SIZE).map(|i| (i * 7 % 256) as u8).collect();
    let mut odd = base.clone();
    if let Some(at) = flip {
        odd[at] ^= 0x55;
    }
    let paths: Vec<PathBuf> = ["a", "b", "c"].iter().map(|n| dir.join(n)).collect();
    fs::write(&paths[0], &base).unwrap();
    fs::write(&paths[1], &base).unwrap();
    fs::write(&paths[2], &odd).unwrap();
    paths
}

#[test]
fn test_sampled_offsets_for_fixture() {
    assert_eq!(
        sample_offsets(SIZE as u64, BLOCK as u64, 4),
        vec![0, 12288, 24576, 36864, 49152, 61440]
    );
}

#[test]
fn test_tail_difference_eliminated_by_sampling() {
    let dir = tempdir().unwrap();
    let paths = write_variants(dir.path(), Some(SIZE - 1));

    let (sets, summary) = DuplicateFinder::new(FinderConfig::default().with_engine(engine()))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].paths, paths[..2].to_vec());
    assert_eq!(summary.eliminated_by_quick_scan, 1);

    // Six samples from three files, then the rest of the surviving pair.
    let sampled = 6 * 3 * BLOCK as u64;
    let remainder = 2 * (SIZE - BLOCK) as u64;
    assert_eq!(summary.bytes_read, sampled + remainder);
}

#[test]
fn test_unsampled_difference_caught_by_comparison() {
    let dir = tempdir().unwrap();
    write_variants(dir.path(), Some(5000));

    let (sets, summary) = DuplicateFinder::new(FinderConfig::default().with_engine(engine()))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 2);
    assert_eq!(summary.eliminated_by_quick_scan, 0);
    assert_eq!(summary.unique_files, 1);
}

#[test]
fn test_sampling_keeps_true_duplicates() {
    let dir = tempdir().unwrap();
    write_variants(dir.path(), None);

    let (sets, summary) = DuplicateFinder::new(FinderConfig::default().with_engine(engine()))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 3);
    assert_eq!(summary.eliminated_by_quick_scan, 0);
}

#[test]
fn test_threshold_disables_sampling() {
    let dir = tempdir().unwrap();
    write_variants(dir.path(), Some(SIZE - 1));

    let engine = engine().with_quick_scan_threshold(SIZE as u64);
    let (sets, summary) = DuplicateFinder::new(FinderConfig::default().with_engine(engine))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(summary.eliminated_by_quick_scan, 0);
    assert_eq!(summary.bytes_read, 3 * SIZE as u64);
}
