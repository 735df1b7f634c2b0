//! Integration tests for the crawler
//!
//! These tests use wiremock to serve small documentation sites and run the
//! full crawl cycle end-to-end, from the root URL to the written markdown.

use doc_fetch::config::Config;
use doc_fetch::crawler::{crawl_to_file, run_crawl, StopReason};
use doc_fetch::output::SkipReason;
use doc_fetch::{CrawlPhase, DocFetchError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an HTML page with an `<h1>` title, one paragraph and a link list
fn html_page(title: &str, body: &str, links: &[&str]) -> String {
    let items: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!(
        r#"<html><head><title>{title} - Documentation</title></head><body>
        <nav><a href="/docs">Home</a></nav>
        <h1>{title}</h1>
        <p>{body}</p>
        <ul>{items}</ul>
        <footer>Copyright</footer>
        </body></html>"#,
        title = title,
        body = body,
        items = items
    )
}

fn html_response(html: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_response(html))
        .mount(server)
        .await;
}

/// Creates a fast test configuration rooted at `<server>/docs/`
///
/// The root is requested as written, so sites mount it at `/docs/`.
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.scope.root_url = Some(format!("{}/docs/", server.uri()));
    config.scope.allow_private_hosts = true;
    config.crawler.max_depth = 2;
    config.crawler.concurrency = 4;
    config.crawler.requests_per_second = 200.0;
    config.crawler.burst = 20;
    config.crawler.request_timeout_secs = 5;
    config.crawler.backoff_base_ms = 10;
    config.crawler.max_backoff_ms = 50;
    config.crawler.max_retry_after_secs = 2;
    config.output.path = dir.path().join("docs.md");
    config
}

fn output_path(config: &Config) -> PathBuf {
    config.output.path.clone()
}

/// Mounts a three-level site: root -> alpha, beta; alpha -> gamma
async fn mount_small_site(server: &MockServer) {
    mount_page(
        server,
        "/docs/",
        html_page("Home", "Welcome to the docs.", &["/docs/alpha", "/docs/beta"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/alpha"))
        .respond_with(
            html_response(html_page("Alpha", "Alpha content.", &["/docs/gamma"]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(server)
        .await;
    mount_page(server, "/docs/beta", html_page("Beta", "Beta content.", &[])).await;
    mount_page(server, "/docs/gamma", html_page("Gamma", "Gamma content.", &[])).await;
}

fn position(markdown: &str, needle: &str) -> usize {
    markdown
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in:\n{}", needle, markdown))
}

#[tokio::test]
async fn test_full_crawl_in_discovery_order() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let out = output_path(&config);

    let report = crawl_to_file(config, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.stop, None);
    assert_eq!(report.stats.included, 4);
    assert_eq!(report.stats.failed, 0);

    let markdown = std::fs::read_to_string(&out).unwrap();
    assert!(markdown.starts_with("# Home\n\n"));

    // Alpha is slower than Beta but was discovered first
    let home = position(&markdown, "<a id=\"home\"></a>");
    let alpha = position(&markdown, "<a id=\"alpha\"></a>");
    let beta = position(&markdown, "<a id=\"beta\"></a>");
    let gamma = position(&markdown, "<a id=\"gamma\"></a>");
    assert!(home < alpha && alpha < beta && beta < gamma);

    assert!(markdown.contains("- [Alpha](#alpha)\n- [Beta](#beta)\n"));
    assert!(markdown.contains(&format!("> Source: <{}/docs/beta>", server.uri())));
    assert!(markdown.contains("Gamma content."));
    assert!(!markdown.contains("Copyright"));
}

#[tokio::test]
async fn test_crawl_is_idempotent() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();

    let first = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();
    let second = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.output.markdown, second.output.markdown);
    assert_eq!(first.output.llm_txt, second.output.llm_txt);
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/alpha"]),
    )
    .await;
    mount_page(
        &server,
        "/docs/alpha",
        html_page("Alpha", "Depth one.", &["/docs/gamma"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/gamma"))
        .respond_with(html_response(html_page("Gamma", "Too deep.", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_depth = 1;

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.stats.included, 2);
    assert!(!report.output.markdown.contains("Too deep."));
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/busy"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/busy",
        html_page("Busy", "Served after waiting.", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let started = std::time::Instant::now();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.retries, 1);
    assert!(report.output.markdown.contains("Served after waiting."));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/flaky"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/flaky",
        html_page("Flaky", "Recovered.", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.failed, 0);
    assert!(report.output.markdown.contains("Recovered."));
}

#[tokio::test]
async fn test_persistent_server_error_is_reported() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/broken"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_retries = 2;

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.stats.failed, 1);
    assert!(matches!(
        report.stats.skipped_urls[0].reason,
        SkipReason::RetriesExhausted(_)
    ));
    assert!(report.output.markdown.contains("/docs/broken>: gave up after retries"));
}

#[tokio::test]
async fn test_unreachable_root_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.scope.root_url = Some("http://127.0.0.1:9/docs/".to_string());
    config.scope.allow_private_hosts = true;
    config.crawler.request_timeout_secs = 2;
    config.output.path = dir.path().join("docs.md");
    let out = output_path(&config);

    let result = crawl_to_file(config, CancellationToken::new()).await;

    assert!(matches!(result, Err(DocFetchError::CrawlFailed(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_root_not_found_fails() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let out = output_path(&config);

    let result = crawl_to_file(config, CancellationToken::new()).await;

    assert!(matches!(result, Err(DocFetchError::CrawlFailed(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private\n"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/private", "/docs/public"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/private"))
        .respond_with(html_response(html_page("Private", "Secret.", &[])))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/public",
        html_page("Public", "Open.", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.skipped, 1);
    assert!(report
        .output
        .markdown
        .contains("/docs/private>: disallowed by robots.txt"));
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", html_page("Home", "Root.", &[])).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.respect_robots = false;

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();
    assert_eq!(report.stats.included, 1);
}

#[tokio::test]
async fn test_duplicate_content_included_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/intro", "/docs/intro-copy"]),
    )
    .await;
    let same = html_page("Intro", "Identical body text.", &[]);
    mount_page(&server, "/docs/intro", same.clone()).await;
    mount_page(&server, "/docs/intro-copy", same).await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.duplicates, 1);
    assert_eq!(report.output.markdown.matches("Identical body text.").count(), 1);
    assert!(report
        .output
        .markdown
        .contains(&format!("> Source: <{}/docs/intro>", server.uri())));
}

#[tokio::test]
async fn test_missing_page_listed_in_summary() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/missing", "/docs/present"]),
    )
    .await;
    mount_page(&server, "/docs/present", html_page("Present", "Here.", &[])).await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.failed, 1);
    let markdown = &report.output.markdown;
    let summary = position(markdown, "## Crawl Summary");
    assert!(position(markdown, "/docs/missing>: HTTP 404") > summary);
}

#[tokio::test]
async fn test_non_html_response_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/data"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 1);
    assert_eq!(
        report.stats.skipped_urls[0].reason,
        SkipReason::NotHtml("application/json".to_string())
    );
}

#[tokio::test]
async fn test_max_pages_cap() {
    let server = MockServer::start().await;
    let links = ["/docs/p1", "/docs/p2", "/docs/p3", "/docs/p4", "/docs/p5"];
    mount_page(&server, "/docs/", html_page("Home", "Root.", &links)).await;
    for (i, link) in links.iter().enumerate() {
        let title = format!("Page {}", i + 1);
        mount_page(&server, link, html_page(&title, &format!("Body {}.", i + 1), &[])).await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_pages = 3;

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.stop, Some(StopReason::PageLimit));
    assert!(!report.was_aborted());
    assert_eq!(report.stats.included, 3);
    let markdown = &report.output.markdown;
    assert!(markdown.contains("Body 1.") && markdown.contains("Body 2."));
    assert!(!markdown.contains("Body 3."));
}

#[tokio::test]
async fn test_out_of_scope_links_not_followed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page(
            "Home",
            "Root.",
            &["/blog/post", "https://example.invalid/docs/x", "/docs/guide.pdf"],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html_response(html_page("Blog", "Off topic.", &[])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 1);
    assert_eq!(report.stats.discovered, 1);
}

#[tokio::test]
async fn test_redirect_out_of_scope_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["/docs/moved"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/blog/moved"))
        .mount(&server)
        .await;
    mount_page(&server, "/blog/moved", html_page("Moved", "Elsewhere.", &[])).await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 1);
    assert!(matches!(
        report.stats.skipped_urls[0].reason,
        SkipReason::RedirectOutOfScope(_)
    ));
}

#[tokio::test]
async fn test_llm_txt_written_next_to_output() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.output.llm_txt = true;
    config.output.title = Some("Example Docs".to_string());

    crawl_to_file(config, CancellationToken::new()).await.unwrap();

    let markdown = std::fs::read_to_string(dir.path().join("docs.md")).unwrap();
    assert!(markdown.starts_with("# Example Docs\n\n"));

    let index = std::fs::read_to_string(dir.path().join("docs.llm.txt")).unwrap();
    assert!(index.starts_with("# llm.txt - AI-friendly documentation index\n"));
    assert!(index.contains(&format!("[SECTION] Alpha\n{}/docs/alpha\n", server.uri())));
    assert_eq!(index.matches("\n[SECTION] ").count(), 4);
}

#[tokio::test]
async fn test_cancelled_crawl_is_aborted() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let out = output_path(&config);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = crawl_to_file(config, cancel).await;

    assert!(matches!(result, Err(DocFetchError::Aborted(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_three_page_site_with_cross_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_response(html_page(
            "Home",
            "Root page.",
            &["/docs/a", "/docs/b"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/a"))
        .respond_with(html_response(html_page(
            "Page A",
            "Page A body.",
            &["/docs/", "/docs/b"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/b"))
        .respond_with(html_response(html_page("Page B", "Page B body.", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_depth = 2;

    let report = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.stats.included, 3);
    assert_eq!(report.stats.discovered, 3);
    let markdown = &report.output.markdown;
    for body in ["Root page.", "Page A body.", "Page B body."] {
        assert_eq!(markdown.matches(body).count(), 1, "{} not included once", body);
    }
    assert!(position(markdown, "Page A body.") < position(markdown, "Page B body."));
}

#[tokio::test]
async fn test_root_requested_with_trailing_slash() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["intro"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html_response(html_page("Wrong", "Without slash.", &["intro"])))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/intro",
        html_page("Intro", "Intro body.", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    let markdown = &report.output.markdown;
    assert!(markdown.contains("Intro body."));
    assert!(markdown.contains(&format!("> Source: <{}/docs/>", server.uri())));
    assert!(markdown.contains(&format!("crawled from <{}/docs/>", server.uri())));
}

#[tokio::test]
async fn test_relative_links_from_directory_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        html_page("Home", "Root.", &["guide/"]),
    )
    .await;
    mount_page(
        &server,
        "/docs/guide/",
        html_page("Guide", "Guide index.", &["setup", "../"]),
    )
    .await;
    mount_page(
        &server,
        "/docs/guide/setup",
        html_page("Setup", "Setup steps.", &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 3);
    assert_eq!(report.stats.failed, 0);
    assert!(report.output.markdown.contains("Setup steps."));
}

#[tokio::test]
async fn test_huge_crawl_delay_does_not_break_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e30\n"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", html_page("Home", "Root.", &["/docs/next"])).await;
    mount_page(&server, "/docs/next", html_page("Next", "Next page.", &[])).await;

    let dir = TempDir::new().unwrap();
    let report = run_crawl(create_test_config(&server, &dir), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.included, 2);
    assert_eq!(report.stats.failed, 0);
}

#[tokio::test]
async fn test_long_crawl_delay_is_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 100000\n"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", html_page("Home", "Root.", &["/docs/next"])).await;
    mount_page(&server, "/docs/next", html_page("Next", "Next page.", &[])).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_crawl_delay_secs = 1;

    let started = std::time::Instant::now();
    let report = run_crawl(config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.stats.included, 2);
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// Mounts a root page that links to one fast and one very slow page
async fn mount_site_with_slow_page(server: &MockServer) {
    mount_page(
        server,
        "/docs/",
        html_page("Home", "Root content.", &["/docs/slow"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/slow"))
        .respond_with(
            html_response(html_page("Slow", "Slow content.", &[]))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_time_limit_keeps_partial_output() {
    let server = MockServer::start().await;
    mount_site_with_slow_page(&server).await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_duration_secs = Some(1);
    let out = output_path(&config);

    let started = std::time::Instant::now();
    let report = crawl_to_file(config, CancellationToken::new()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(report.stop, Some(StopReason::TimeLimit));
    assert!(report.was_aborted());
    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.stats.included, 1);

    let markdown = std::fs::read_to_string(&out).unwrap();
    assert!(markdown.contains("Root content."));
    assert!(!markdown.contains("Slow content."));
}

#[tokio::test]
async fn test_time_limit_with_discard_on_abort_writes_nothing() {
    let server = MockServer::start().await;
    mount_site_with_slow_page(&server).await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.crawler.max_duration_secs = Some(1);
    config.output.discard_on_abort = true;
    let out = output_path(&config);

    let result = crawl_to_file(config, CancellationToken::new()).await;

    assert!(matches!(result, Err(DocFetchError::Aborted(_))));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_interrupt_mid_crawl_keeps_partial_output() {
    let server = MockServer::start().await;
    mount_site_with_slow_page(&server).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        interrupt.cancel();
    });

    let report = run_crawl(config, cancel).await.unwrap();

    assert_eq!(report.stop, Some(StopReason::Interrupted));
    assert!(report.was_aborted());
    assert_eq!(report.stats.included, 1);
    assert!(report.output.markdown.contains("Root content."));
}
