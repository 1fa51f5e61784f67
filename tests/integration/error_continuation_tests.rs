use blockdupe::duplicates::{DuplicateFinder, EngineConfig, FinderConfig, FinderError};
use blockdupe::scanner::{FileEntry, HashError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_vanished_file_is_reported_and_skipped() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let gone = dir.path().join("gone.bin");
    fs::write(&a, b"0123456789").unwrap();
    fs::write(&b, b"0123456789").unwrap();

    let files = vec![
        FileEntry::new(a.clone(), 10),
        FileEntry::new(gone.clone(), 10),
        FileEntry::new(b.clone(), 10),
    ];
    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].paths, vec![a, b]);
    assert_eq!(summary.unreadable.len(), 1);
    assert!(matches!(&summary.unreadable[0], HashError::NotFound(p) if *p == gone));
    assert!(summary.has_errors());
}

#[test]
fn test_file_shrunk_after_collection() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let short = dir.path().join("short.bin");
    fs::write(&a, [9u8; 64]).unwrap();
    fs::write(&b, [9u8; 64]).unwrap();
    fs::write(&short, [9u8; 40]).unwrap();

    let files = vec![
        FileEntry::new(a, 64),
        FileEntry::new(b, 64),
        FileEntry::new(short.clone(), 64),
    ];
    let engine = EngineConfig::default().with_block_size(16);
    let (sets, summary) = DuplicateFinder::new(FinderConfig::default().with_engine(engine))
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].len(), 2);
    assert!(matches!(&summary.unreadable[0], HashError::Truncated(p) if *p == short));
}

#[test]
fn test_every_member_unreadable() {
    let files = vec![
        FileEntry::new(PathBuf::from("/nonexistent/blockdupe/a"), 5),
        FileEntry::new(PathBuf::from("/nonexistent/blockdupe/b"), 5),
    ];
    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.unreadable.len(), 2);
}

#[test]
fn test_missing_root_is_fatal() {
    let result = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[PathBuf::from("/nonexistent/blockdupe/root")]);
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_permission_denied_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    let locked = dir.path().join("locked.bin");
    fs::write(&a, b"AAAAAAAAAA").unwrap();
    fs::write(&b, b"AAAAAAAAAA").unwrap();
    fs::write(&locked, b"AAAAAAAAAA").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still open the file.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths(&[dir.path().to_path_buf()])
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].paths, vec![a, b]);
    assert_eq!(summary.unreadable.len(), 1);
    assert!(matches!(&summary.unreadable[0], HashError::PermissionDenied(p) if *p == locked));
}
