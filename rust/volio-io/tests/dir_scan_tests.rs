use std::{collections::BTreeSet, ffi::OsString};

use tempfile::TempDir;
use volio_io::{DirScanner, ErrorCode, FileSystem, RetryPolicy};

fn create_slot_dir(dir: &TempDir) {
    std::fs::write(dir.path().join("init_data.xml"), b"<init/>").unwrap();
    std::fs::write(dir.path().join("stderr.txt"), b"").unwrap();
    std::fs::create_dir(dir.path().join("shmem")).unwrap();
}

#[test]
fn test_owned_scanner_scan_loop() {
    let dir = TempDir::new().unwrap();
    create_slot_dir(&dir);

    let mut scanner = DirScanner::new(dir.path());
    let mut names = BTreeSet::new();
    while let Some(name) = scanner.scan() {
        names.insert(name);
    }
    assert_eq!(
        names,
        BTreeSet::from([
            OsString::from("init_data.xml"),
            OsString::from("shmem"),
            OsString::from("stderr.txt"),
        ])
    );
    assert_eq!(scanner.scan(), None);
    assert!(!scanner.is_open());
}

#[test]
fn test_strict_open_then_entries() {
    let dir = TempDir::new().unwrap();
    create_slot_dir(&dir);

    let scanner = DirScanner::open(dir.path()).unwrap();
    assert_eq!(scanner.entries().count(), 3);

    let err = DirScanner::open(dir.path().join("missing")).err().unwrap();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn test_scan_after_clean_out() {
    let dir = TempDir::new().unwrap();
    create_slot_dir(&dir);

    <FileSystem>::default().clean_out_dir(dir.path()).unwrap();
    let mut scanner = DirScanner::new(dir.path());
    assert_eq!(scanner.scan(), None);

    let fs = FileSystem::new(RetryPolicy::none());
    assert_eq!(fs.dir_size(dir.path(), true).unwrap(), 0);
}
