//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end.

use std::time::{Duration, Instant};
use sumi_crawl::config::Config;
use sumi_crawl::crawler::Coordinator;
use sumi_crawl::CrawlReport;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration seeded at `start_url`
pub fn create_test_config(start_url: &str) -> Config {
    let mut config = Config::for_seed(start_url);
    config.crawler.max_concurrent = 2;
    config.politeness.delay_ms = 0;
    config.politeness.respect_robots = false;
    config.http.retry_base_delay_ms = 1;
    config.http.timeout_secs = 5;
    config
}

/// An HTML page with a unique paragraph and the given links
pub fn page(text: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
            text, text, anchors
        ),
        "text/html",
    )
}

pub async fn mount_page(server: &MockServer, at: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

pub async fn crawl(config: Config) -> CrawlReport {
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    coordinator
        .run(CancellationToken::new())
        .await
        .expect("Crawl failed")
}

fn crawled_paths(report: &CrawlReport) -> Vec<String> {
    let mut paths: Vec<String> = report
        .pages
        .iter()
        .map(|p| p.url.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_budget_and_depth_limits() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/p1", "/p2"]), 1).await;
    mount_page(&server, "/p1", page("One", &["/", "/p3"]), 1).await;
    mount_page(&server, "/p2", page("Two", &["/", "/p3"]), 1).await;
    mount_page(&server, "/p3", page("Three", &[]), 0).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.max_pages = 3;
    config.crawler.max_depth = 1;

    let report = crawl(config).await;

    assert!(!report.cancelled);
    assert_eq!(report.stats.pages_crawled, 3);
    assert_eq!(report.stats.urls_discovered, 2);
    assert_eq!(crawled_paths(&report), vec!["/", "/p1", "/p2"]);
    assert!(report.pages.iter().all(|p| p.depth <= 1));
}

#[tokio::test]
async fn test_page_budget_caps_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b", "/c", "/d"]), 1).await;
    for (at, text) in [("/a", "A"), ("/b", "B"), ("/c", "C"), ("/d", "D")] {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(page(text, &[]))
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server.uri());
    config.crawler.max_pages = 2;
    config.crawler.max_concurrent = 4;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_shared_link_fetched_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b", "/shared"]), 1).await;
    mount_page(&server, "/a", page("A", &["/shared", "/b"]), 1).await;
    mount_page(&server, "/b", page("B", &["/shared", "/a"]), 1).await;
    mount_page(&server, "/shared", page("Shared", &["/"]), 1).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.max_concurrent = 4;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 4);
    assert_eq!(crawled_paths(&report), vec!["/", "/a", "/b", "/shared"]);
}

#[tokio::test]
async fn test_same_domain_requests_are_spaced() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("A", &[]), 1).await;
    mount_page(&server, "/b", page("B", &[]), 1).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.max_concurrent = 3;
    config.politeness.delay_ms = 200;

    let started = Instant::now();
    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 3);
    // Three fetches to one domain need at least two full delays
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &["/private", "/public"]), 1).await;
    mount_page(&server, "/public", page("Public", &[]), 1).await;
    mount_page(&server, "/private", page("Private", &[]), 0).await;

    let mut config = create_test_config(&server.uri());
    config.politeness.respect_robots = true;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.robots_blocked, 1);
}

#[tokio::test]
async fn test_robots_group_for_our_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: SumiCrawl\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
        ))
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &[]), 0).await;

    let mut config = create_test_config(&server.uri());
    config.politeness.respect_robots = true;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 0);
    assert_eq!(report.stats.robots_blocked, 1);
}

#[tokio::test]
async fn test_redirected_robots_applies_when_redirects_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/moved-robots.txt", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved-robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &["/private/x", "/public"]), 1).await;
    mount_page(&server, "/public", page("Public", &[]), 1).await;
    mount_page(&server, "/private/x", page("Private", &[]), 0).await;

    let mut config = create_test_config(&server.uri());
    config.politeness.respect_robots = true;
    config.http.follow_redirects = false;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.robots_blocked, 1);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", page("A", &[]), 1).await;

    let mut config = create_test_config(&server.uri());
    config.politeness.respect_robots = true;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.robots_blocked, 0);
}

#[tokio::test]
async fn test_duplicate_content_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("Same words", &[]), 1).await;
    mount_page(&server, "/b", page("Same words", &[]), 1).await;

    let report = crawl(create_test_config(&server.uri())).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.duplicates_skipped, 1);
    assert_eq!(report.pages.len(), 2);
}

#[tokio::test]
async fn test_duplicates_kept_when_dedupe_disabled() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", page("Same words", &[]), 1).await;
    mount_page(&server, "/b", page("Same words", &[]), 1).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.deduplicate = false;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 3);
    assert_eq!(report.stats.duplicates_skipped, 0);
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.http.max_retries = 3;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 0);
    assert_eq!(report.stats.errors, 1);
    assert!(report.pages.is_empty());
}

#[tokio::test]
async fn test_not_found_is_counted_without_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/missing"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&server.uri())).await;

    assert_eq!(report.stats.pages_crawled, 1);
    assert_eq!(report.stats.errors, 1);
}

#[tokio::test]
async fn test_non_html_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/data"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&server.uri())).await;

    assert_eq!(report.stats.pages_crawled, 1);
    assert_eq!(report.stats.errors, 0);
}

#[tokio::test]
async fn test_external_links_filtered() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let external = format!("http://localhost:{}/elsewhere", other.address().port());

    mount_page(&server, "/", page("Home", &[&external, "/local"]), 1).await;
    mount_page(&server, "/local", page("Local", &[]), 1).await;
    mount_page(&other, "/elsewhere", page("Elsewhere", &[]), 0).await;

    let report = crawl(create_test_config(&server.uri())).await;

    assert_eq!(report.stats.pages_crawled, 2);
    assert_eq!(report.stats.urls_discovered, 1);
}

#[tokio::test]
async fn test_external_links_followed_when_allowed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let external = format!("http://localhost:{}/elsewhere", other.address().port());

    mount_page(&server, "/", page("Home", &[&external]), 1).await;
    mount_page(&other, "/elsewhere", page("Elsewhere", &[]), 1).await;

    let mut config = create_test_config(&server.uri());
    config.crawler.same_domain = false;

    let report = crawl(config).await;

    assert_eq!(report.stats.pages_crawled, 2);
}

#[tokio::test]
async fn test_cancellation_stops_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("Slow", &[]).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server.uri())).unwrap();
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
    }

    let started = Instant::now();
    let report = coordinator.run(cancel).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.stats.pages_crawled, 0);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_page_result_fields() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        ResponseTemplate::new(200).set_body_raw(
            r#"<html><head>
                <title>Welcome</title>
                <meta name="description" content="A test site">
                <meta name="keywords" content="rust, crawler">
            </head><body>
                <nav><a href="/nav">Menu</a></nav>
                <main><h1>Hello</h1><p>First paragraph here.</p></main>
                <script>var x = 1;</script>
            </body></html>"#,
            "text/html",
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/nav"))
        .respond_with(page("Nav", &[]))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.crawler.max_depth = 0;

    let report = crawl(config).await;
    let home = &report.pages[0];

    assert_eq!(home.status_code, 200);
    assert_eq!(home.title.as_deref(), Some("Welcome"));
    assert_eq!(home.description.as_deref(), Some("A test site"));
    assert_eq!(home.keywords, vec!["rust", "crawler"]);
    assert_eq!(home.text, "# Hello\n\nFirst paragraph here.");
    assert_eq!(home.word_count, 5);
    assert_eq!(home.content_hash, sumi_crawl::crawler::content_hash(&home.text));
    assert!(home.links.iter().any(|l| l.path() == "/nav"));
}
