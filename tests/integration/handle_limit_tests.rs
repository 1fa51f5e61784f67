use blockdupe::duplicates::{
    DuplicateFinder, DuplicateSet, EngineConfig, FinderConfig, ScanSummary,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn populate(dir: &Path) {
    let mut content = vec![0u8; 4096];
    for (i, byte) in content.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    fs::write(dir.join("a0"), &content).unwrap();
    fs::write(dir.join("a1"), &content).unwrap();
    fs::write(dir.join("a2"), &content).unwrap();
    content[3000] ^= 0xff;
    fs::write(dir.join("b0"), &content).unwrap();
    fs::write(dir.join("b1"), &content).unwrap();
}

fn run(dir: &Path, engine: EngineConfig) -> (Vec<DuplicateSet>, ScanSummary) {
    DuplicateFinder::new(FinderConfig::default().with_engine(engine))
        .find_duplicates_in_paths(&[dir.to_path_buf()])
        .unwrap()
}

#[test]
fn test_single_handle_ceiling_closes_every_round() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let base = EngineConfig::default().with_block_size(64);
    let (limited_sets, limited) = run(dir.path(), base.clone().with_max_open_handles(1));
    let (open_sets, open) = run(dir.path(), base.with_max_open_handles(1000));

    assert!(limited.rounds > 0);
    assert_eq!(limited.closed_rounds, limited.rounds);
    assert!(limited.peak_open_handles <= 1);

    assert_eq!(open.closed_rounds, 0);
    assert!(open.peak_open_handles >= 2);

    assert_eq!(limited_sets.len(), 2);
    assert_eq!(limited_sets, open_sets);
}

#[test]
fn test_close_mode_reads_larger_chunks() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let base = EngineConfig::default()
        .with_block_size(64)
        .with_closed_handle_chunk_factor(8);
    let (_, limited) = run(dir.path(), base.clone().with_max_open_handles(1));
    let (_, open) = run(dir.path(), base.with_max_open_handles(1000));

    // 4096 / 64 = 64 open rounds, 4096 / 512 = 8 closed rounds.
    assert_eq!(open.rounds, 64);
    assert_eq!(limited.rounds, 8);
}

#[test]
fn test_ceiling_holds_across_parallel_size_classes() {
    let dir = tempdir().unwrap();
    for size in 1..=8usize {
        for copy in 0..4 {
            fs::write(dir.path().join(format!("{size}_{copy}")), vec![b'k'; size * 100]).unwrap();
        }
    }

    let engine = EngineConfig::default()
        .with_block_size(16)
        .with_max_open_handles(3)
        .with_jobs(4);
    let (sets, summary) = run(dir.path(), engine);

    assert_eq!(sets.len(), 8);
    assert!(summary.peak_open_handles <= 3);
}
