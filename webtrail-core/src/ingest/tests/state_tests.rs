use crate::ingest::{FileState, ScanStateStore};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn missing_file_loads_as_empty_state() {
    // Arrange
    let dir = tempdir().unwrap();

    // Act
    let state = ScanStateStore::load(dir.path().join("scan_state.json"));

    // Assert
    assert_eq!(state.file_state("blog", Path::new("/var/log/a.log")), None);
    assert_eq!(state.start_offset("blog", Path::new("/var/log/a.log"), 100), 0);
}

#[test]
fn corrupt_file_loads_as_empty_state() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan_state.json");
    fs::write(&path, "{{{ definitely not json").unwrap();

    // Act
    let state = ScanStateStore::load(&path);

    // Assert
    assert_eq!(state.file_state("blog", Path::new("/var/log/a.log")), None);
}

#[test]
fn saved_state_round_trips() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan_state.json");
    let log = Path::new("/var/log/nginx/blog.access.log");

    let mut state = ScanStateStore::load(&path);
    state.record_scan("blog", log, 4096);
    state.record_scan("shop", Path::new("/var/log/nginx/shop.access.log"), 128);
    state.save().unwrap();

    // Act
    let reloaded = ScanStateStore::load(&path);

    // Assert
    assert_eq!(
        reloaded.file_state("blog", log),
        Some(FileState {
            last_offset: 4096,
            last_size: 4096,
        })
    );
    assert_eq!(reloaded.start_offset("blog", log, 8192), 4096);
}

#[test]
fn shrunken_file_restarts_at_offset_zero() {
    // Arrange
    let dir = tempdir().unwrap();
    let mut state = ScanStateStore::load(dir.path().join("scan_state.json"));
    let log = Path::new("/var/log/nginx/blog.access.log");
    state.record_scan("blog", log, 1000);

    // Assert: smaller means rotated, larger or equal resumes.
    assert_eq!(state.start_offset("blog", log, 200), 0);
    assert_eq!(state.start_offset("blog", log, 1000), 1000);
    assert_eq!(state.start_offset("blog", log, 1500), 1000);
}

#[test]
fn record_scan_sets_offset_and_size_to_current_size() {
    // Arrange
    let dir = tempdir().unwrap();
    let mut state = ScanStateStore::load(dir.path().join("scan_state.json"));
    let log = Path::new("/var/log/a.log");

    // Act
    state.record_scan("blog", log, 777);

    // Assert
    assert_eq!(
        state.file_state("blog", log),
        Some(FileState {
            last_offset: 777,
            last_size: 777,
        })
    );
}
