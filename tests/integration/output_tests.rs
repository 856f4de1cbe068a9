//! Integration tests for persisting crawl results
//!
//! A real crawl against a mock server is written to a temporary SQLite
//! database and markdown summary, then read back.

use crate::crawl_tests::{crawl, create_test_config, mount_page, page};
use sumi_crawl::output::write_outputs;
use sumi_crawl::storage::{RunStatus, SqliteStorage, Storage};
use tempfile::tempdir;
use wiremock::MockServer;

#[tokio::test]
async fn test_crawl_results_stored_in_database() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("A", &["/"]), 1).await;
    mount_page(&server, "/b", page("B", &[]), 1).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let summary_path = dir.path().join("summary.md");

    let mut config = create_test_config(&server.uri());
    config.output.database_path = Some(db_path.to_string_lossy().into_owned());
    config.output.summary_path = Some(summary_path.to_string_lossy().into_owned());

    let report = crawl(config.clone()).await;
    let seed = url::Url::parse(&server.uri()).unwrap();
    let run_id = write_outputs(&config.output, &report, &seed, "test-hash")
        .unwrap()
        .expect("database configured");

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.pages_crawled, 3);
    assert_eq!(run.urls_discovered, 2);
    assert!(run.finished_at.is_some());

    assert_eq!(storage.count_pages(run_id).unwrap(), 3);
    // "/" links to /a and /b, "/a" links back to "/"
    assert_eq!(storage.count_links(run_id).unwrap(), 3);

    let breakdown = storage.get_depth_breakdown(run_id).unwrap();
    assert_eq!(breakdown.get(&0), Some(&1));
    assert_eq!(breakdown.get(&1), Some(&2));

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains(&format!("- **Run ID**: {}", run_id)));
    assert!(summary.contains("- **Pages Crawled**: 3"));
    assert!(summary.contains("| 1 | 2 |"));
}

#[tokio::test]
async fn test_second_run_appends() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &[]), 2).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");

    let mut config = create_test_config(&server.uri());
    config.output.database_path = Some(db_path.to_string_lossy().into_owned());
    let seed = url::Url::parse(&server.uri()).unwrap();

    let first = crawl(config.clone()).await;
    let first_id = write_outputs(&config.output, &first, &seed, "h")
        .unwrap()
        .unwrap();
    let second = crawl(config.clone()).await;
    let second_id = write_outputs(&config.output, &second, &seed, "h")
        .unwrap()
        .unwrap();

    assert_ne!(first_id, second_id);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.get_latest_run().unwrap().unwrap().id, second_id);
    assert_eq!(storage.count_pages(first_id).unwrap(), 1);
    assert_eq!(storage.count_pages(second_id).unwrap(), 1);
}
