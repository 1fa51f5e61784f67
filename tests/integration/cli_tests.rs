use blockdupe::cli::{Cli, Commands, OutputFormat};
use blockdupe::duplicates::FinderError;
use blockdupe::error::ExitCode;
use blockdupe::run_app;
use clap::Parser;
use std::fs;
use tempfile::tempdir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_scan_args_parse() {
    let cli = parse(&[
        "blockdupe",
        "-v",
        "scan",
        "/a",
        "/b",
        "--block-size",
        "128KiB",
        "--max-open-files",
        "16",
        "--media",
        "expensive",
        "-j",
        "2",
        "--output",
        "json",
    ]);

    assert_eq!(cli.verbose, 1);
    let Commands::Scan(args) = cli.command else {
        panic!("expected scan");
    };
    assert_eq!(args.paths.len(), 2);
    assert_eq!(args.block_size, Some(131_072));
    assert_eq!(args.max_open_files, Some(16));
    assert_eq!(args.jobs, Some(2));
    assert_eq!(args.output, OutputFormat::Json);
}

#[test]
fn test_scan_requires_path() {
    assert!(Cli::try_parse_from(["blockdupe", "scan"]).is_err());
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    assert!(Cli::try_parse_from(["blockdupe", "-q", "-v", "scan", "."]).is_err());
}

#[test]
fn test_run_scan_exit_codes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();
    let root = dir.path().to_str().unwrap();

    let code = run_app(parse(&["blockdupe", "-q", "scan", root, "--media", "cheap"])).unwrap();
    assert_eq!(code, ExitCode::Success);

    fs::write(dir.path().join("b"), b"solo").unwrap();
    let code = run_app(parse(&[
        "blockdupe", "-q", "scan", root, "--media", "cheap", "--output", "csv",
    ]))
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_run_scan_missing_path() {
    let err = run_app(parse(&["blockdupe", "-q", "scan", "/nonexistent/blockdupe/cli"]))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_run_scan_rejects_zero_block_size() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let err = run_app(parse(&["blockdupe", "-q", "scan", root, "--block-size", "0"])).unwrap_err();
    assert!(format!("{err:#}").contains("block size"));
}

#[test]
fn test_run_scan_with_config_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a"), b"0123456789").unwrap();
    fs::write(data.join("b"), b"0123456789").unwrap();
    let config = dir.path().join("blockdupe.toml");
    fs::write(&config, "block_size = 4\nmedia = \"cheap\"\nmin_size = 100\n").unwrap();

    // min_size from the file filters both files out.
    let code = run_app(parse(&[
        "blockdupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        data.to_str().unwrap(),
        "--output",
        "json",
    ]))
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    // A flag overrides the file.
    let code = run_app(parse(&[
        "blockdupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        data.to_str().unwrap(),
        "--min-size",
        "1",
        "--output",
        "json",
    ]))
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_run_scan_missing_config_file() {
    let dir = tempdir().unwrap();
    let err = run_app(parse(&[
        "blockdupe",
        "-q",
        "--config",
        "/nonexistent/blockdupe.toml",
        "scan",
        dir.path().to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}

#[test]
fn test_run_config_defaults() {
    let code = run_app(parse(&["blockdupe", "config", "--defaults"])).unwrap();
    assert_eq!(code, ExitCode::Success);
}
