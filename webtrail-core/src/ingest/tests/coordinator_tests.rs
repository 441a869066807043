use crate::config::{LogFormat, SiteConfig};
use crate::ingest::tests::support::{MemoryStore, StubEnricher, combined_line};
use crate::ingest::{LogIngestor, ScanStateStore, SiteError};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn site(id: &str, log_path: &str) -> SiteConfig {
    SiteConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        log_path: log_path.to_string(),
        format: LogFormat::Nginx,
    }
}

fn write_log(path: &Path, count: usize) {
    let timestamp = Utc::now() - Duration::days(1);
    let mut out = String::new();
    for i in 0..count {
        out.push_str(&combined_line(timestamp, &format!("/p/{i}"), 200));
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn ingestor(sites: Vec<SiteConfig>, state_path: PathBuf, store: Arc<MemoryStore>) -> LogIngestor {
    LogIngestor::new(sites, state_path, store, Arc::new(StubEnricher))
}

#[tokio::test]
async fn outcomes_follow_configuration_order() {
    // Arrange
    let dir = tempdir().unwrap();
    let blog = dir.path().join("blog.log");
    let shop = dir.path().join("shop.log");
    write_log(&blog, 2);
    write_log(&shop, 3);

    let store = MemoryStore::new();
    let mut ingestor = ingestor(
        vec![
            site("shop", shop.to_str().unwrap()),
            site("blog", blog.to_str().unwrap()),
        ],
        dir.path().join("scan_state.json"),
        store.clone(),
    );

    // Act
    let outcomes = ingestor.run_pass().await;

    // Assert
    let ids: Vec<&str> = outcomes.iter().map(|o| o.site_id.as_str()).collect();
    assert_eq!(ids, vec!["shop", "blog"]);
    assert_eq!(outcomes[0].total_entries, 3);
    assert_eq!(outcomes[1].total_entries, 2);
    assert!(outcomes.iter().all(|o| o.success));
}

#[tokio::test]
async fn glob_matching_no_files_fails_that_site_only() {
    // Arrange
    let dir = tempdir().unwrap();
    let blog = dir.path().join("blog.log");
    write_log(&blog, 1);

    let store = MemoryStore::new();
    let empty_glob = dir.path().join("missing/*.log");
    let mut ingestor = ingestor(
        vec![
            site("ghost", empty_glob.to_str().unwrap()),
            site("blog", blog.to_str().unwrap()),
        ],
        dir.path().join("scan_state.json"),
        store,
    );

    // Act
    let outcomes = ingestor.run_pass().await;

    // Assert
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].total_entries, 0);
    assert!(matches!(outcomes[0].error, Some(SiteError::NoMatches { .. })));
    assert!(outcomes[1].success);
    assert_eq!(outcomes[1].total_entries, 1);
}

#[tokio::test]
async fn unreadable_literal_path_fails_that_site_only() {
    // Arrange
    let dir = tempdir().unwrap();
    let blog = dir.path().join("blog.log");
    write_log(&blog, 2);

    let store = MemoryStore::new();
    let missing = dir.path().join("missing.log");
    let mut ingestor = ingestor(
        vec![
            site("broken", missing.to_str().unwrap()),
            site("blog", blog.to_str().unwrap()),
        ],
        dir.path().join("scan_state.json"),
        store,
    );

    // Act
    let outcomes = ingestor.run_pass().await;

    // Assert
    assert!(!outcomes[0].success);
    assert!(matches!(outcomes[0].error, Some(SiteError::File(_))));
    assert!(outcomes[1].success);
    assert_eq!(outcomes[1].total_entries, 2);
}

#[tokio::test]
async fn glob_aggregates_entries_across_matched_files() {
    // Arrange
    let dir = tempdir().unwrap();
    write_log(&dir.path().join("a.access.log"), 2);
    write_log(&dir.path().join("b.access.log"), 3);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let store = MemoryStore::new();
    let pattern = dir.path().join("*.access.log");
    let mut ingestor = ingestor(
        vec![site("multi", pattern.to_str().unwrap())],
        dir.path().join("scan_state.json"),
        store.clone(),
    );

    // Act
    let outcomes = ingestor.run_pass().await;

    // Assert
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].total_entries, 5);
    assert_eq!(store.total_records(), 5);
}

#[tokio::test]
async fn unreadable_glob_match_does_not_fail_the_site() {
    // Arrange: one matched path is a directory, which cannot be read as a
    // log file.
    let dir = tempdir().unwrap();
    write_log(&dir.path().join("a.access.log"), 2);
    fs::create_dir(dir.path().join("b.access.log")).unwrap();

    let store = MemoryStore::new();
    let pattern = dir.path().join("*.access.log");
    let mut ingestor = ingestor(
        vec![site("multi", pattern.to_str().unwrap())],
        dir.path().join("scan_state.json"),
        store,
    );

    // Act
    let outcomes = ingestor.run_pass().await;

    // Assert
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].total_entries, 2);
}

#[tokio::test]
async fn scan_state_is_persisted_once_per_pass() {
    // Arrange
    let dir = tempdir().unwrap();
    let blog = dir.path().join("blog.log");
    write_log(&blog, 2);
    let state_path = dir.path().join("scan_state.json");

    let store = MemoryStore::new();
    let mut ingestor = ingestor(
        vec![site("blog", blog.to_str().unwrap())],
        state_path.clone(),
        store,
    );

    // Act
    ingestor.run_pass().await;

    // Assert: the durable document round-trips to the in-memory state.
    let reloaded = ScanStateStore::load(&state_path);
    let size = fs::metadata(&blog).unwrap().len();
    assert_eq!(
        reloaded.file_state("blog", &blog),
        ingestor.state().file_state("blog", &blog),
    );
    assert_eq!(reloaded.file_state("blog", &blog).unwrap().last_offset, size);
}
