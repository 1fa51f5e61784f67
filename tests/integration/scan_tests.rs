use blockdupe::duplicates::{DuplicateFinder, EngineConfig, FinderConfig, MediaSeekCost};
use blockdupe::scanner::WalkerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn finder_with(engine: EngineConfig) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_engine(engine))
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (sets, summary) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_sets, 0);
}

#[test]
fn test_identical_pair_and_odd_one_out() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"AAAAAAAAAA");
    let b = write(dir.path(), "b.txt", b"AAAAAAAAAA");
    let c = write(dir.path(), "c.txt", b"AAAAAAAAAB");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    let mut members = sets[0].paths.clone();
    members.sort();
    assert_eq!(members, vec![a, b]);
    assert!(!sets[0].paths.contains(&c));
    assert_eq!(sets[0].size, 10);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.unique_files, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 10);
}

#[test]
fn test_last_byte_difference_splits_in_final_round() {
    let dir = tempdir().unwrap();
    let mut left = vec![b'x'; 4096];
    let right = left.clone();
    left[4095] = b'y';
    write(dir.path(), "left.bin", &left);
    write(dir.path(), "right.bin", &right);

    let engine = EngineConfig::default().with_block_size(1024);
    let (sets, summary) = finder_with(engine)
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.rounds, 4);
    assert_eq!(summary.bytes_read, 2 * 4096);
    assert_eq!(summary.unique_files, 2);
}

#[test]
fn test_early_difference_stops_reading() {
    let dir = tempdir().unwrap();
    let mut left = vec![0u8; 1 << 20];
    let right = left.clone();
    left[0] = 1;
    write(dir.path(), "left.bin", &left);
    write(dir.path(), "right.bin", &right);

    let engine = EngineConfig::default()
        .with_block_size(4096)
        .with_quick_scan_threshold(0);
    let (sets, summary) = finder_with(engine)
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.bytes_read, 2 * 4096);
}

#[test]
fn test_nested_directories_and_multiple_roots() {
    let dir = tempdir().unwrap();
    let other = tempdir().unwrap();
    write(dir.path(), "one/deep/x.bin", b"same bytes");
    write(dir.path(), "two/y.bin", b"same bytes");
    write(other.path(), "z.bin", b"same bytes");
    write(other.path(), "w.bin", b"diff bytes");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), other.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 3);
    assert_eq!(summary.total_files, 4);
}

#[test]
fn test_several_sets_in_one_size_class() {
    let dir = tempdir().unwrap();
    for i in 0..3 {
        write(dir.path(), &format!("a{i}"), b"aaaa");
        write(dir.path(), &format!("b{i}"), b"bbbb");
    }
    write(dir.path(), "c", b"cccc");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sets.len(), 2);
    assert!(sets.iter().all(|set| set.len() == 3));
    assert_ne!(sets[0].fingerprint, sets[1].fingerprint);
    assert_eq!(summary.unique_files, 1);
}

#[test]
fn test_sets_ordered_by_size() {
    let dir = tempdir().unwrap();
    write(dir.path(), "big1", &[7u8; 300]);
    write(dir.path(), "big2", &[7u8; 300]);
    write(dir.path(), "small1", &[7u8; 3]);
    write(dir.path(), "small2", &[7u8; 3]);

    let (sets, _) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    let sizes: Vec<u64> = sets.iter().map(|s| s.size).collect();
    assert_eq!(sizes, vec![3, 300]);
}

#[test]
fn test_empty_files_reported_unless_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].size, 0);
    assert_eq!(summary.bytes_read, 0);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_empty: true,
        ..Default::default()
    });
    let (sets, _) = DuplicateFinder::new(config)
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    assert!(sets.is_empty());
}

#[test]
fn test_expensive_media_matches_cheap_media() {
    let dir = tempdir().unwrap();
    let mut payload = vec![3u8; 10_000];
    write(dir.path(), "a", &payload);
    write(dir.path(), "b", &payload);
    payload[5_000] = 4;
    write(dir.path(), "c", &payload);
    write(dir.path(), "d", &payload);
    payload[9_999] = 5;
    write(dir.path(), "e", &payload);

    let cheap = EngineConfig::default().with_block_size(512);
    let expensive = cheap.clone().with_media_seek_cost(MediaSeekCost::Expensive);

    let (cheap_sets, cheap_summary) = finder_with(cheap)
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let (expensive_sets, expensive_summary) = finder_with(expensive)
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    let mut cheap_paths: Vec<_> = cheap_sets.iter().map(|s| s.paths.clone()).collect();
    let mut expensive_paths: Vec<_> = expensive_sets.iter().map(|s| s.paths.clone()).collect();
    cheap_paths.iter_mut().for_each(|p| p.sort());
    expensive_paths.iter_mut().for_each(|p| p.sort());
    cheap_paths.sort();
    expensive_paths.sort();

    assert_eq!(cheap_paths.len(), 2);
    assert_eq!(cheap_paths, expensive_paths);
    assert_eq!(cheap_summary.sequentially_hashed, 0);
    assert_eq!(expensive_summary.sequentially_hashed, 5);
    assert!(expensive_summary.peak_open_handles <= 1);
}

#[test]
fn test_runs_are_deterministic() {
    let dir = tempdir().unwrap();
    for i in 0..6u8 {
        write(dir.path(), &format!("f{i}"), &[i % 3; 2048]);
    }

    let finder = finder_with(EngineConfig::default().with_block_size(256));
    let (first, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let (second, _) = finder
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_parallel_jobs_match_sequential() {
    let dir = tempdir().unwrap();
    for size in [10usize, 100, 1000, 5000] {
        for copy in 0..3 {
            write(dir.path(), &format!("s{size}_{copy}"), &vec![b'q'; size]);
        }
        write(dir.path(), &format!("s{size}_odd"), &vec![b'r'; size]);
    }

    let base = EngineConfig::default().with_block_size(64);
    let (sequential, _) = finder_with(base.clone())
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let (parallel, summary) = finder_with(base.with_jobs(4))
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(sequential.len(), 4);
    assert_eq!(sequential, parallel);
    assert_eq!(summary.duplicate_files, 8);
}

#[test]
fn test_aliased_roots_do_not_pair_a_file_with_itself() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(dir.path(), "only.bin", b"one of a kind");
    let alias = dir.path().join("sub").join("..");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf(), alias])
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_nested_root_walked_once() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "inner/a.bin", b"twin");
    let b = write(dir.path(), "b.bin", b"twin");

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().join("inner"), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(sets.len(), 1);
    let mut members = sets[0].paths.clone();
    members.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(members, expected);
}
