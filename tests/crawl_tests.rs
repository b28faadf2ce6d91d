//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the crawled site and tempfile
//! directories for the two stores, and drive whole rounds end-to-end.

use cachecrawl::config::{Config, CrawlerConfig, ProxyConfig, ProxyEndpoint, StorageConfig};
use cachecrawl::crawler::{Coordinator, FetchSource, Fetcher, Frontier, ProxyPool};
use cachecrawl::storage::{ContentStore, DigestStore, LinkIndex};
use cachecrawl::url::{CanonicalUrl, LinkNormalizer, LinkSet};
use cachecrawl::{CrawlError, FetchError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
fn create_test_config(seed: &str, dir: &TempDir, rounds: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed: seed.to_string(),
            rounds,
            pool_size: 4,
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            user_agent: Some("cachecrawl-tests/1.0".to_string()),
        },
        storage: StorageConfig {
            pages_dir: dir.path().join("htmls"),
            links_dir: dir.path().join("links"),
        },
        proxy: ProxyConfig::default(),
    }
}

/// Builds a direct (proxy-less) fetcher over fresh stores in `dir`
fn create_fetcher(config: &Config) -> Fetcher {
    Fetcher::new(
        ContentStore::open(&config.storage.pages_dir).expect("Failed to open content store"),
        LinkIndex::open(&config.storage.links_dir).expect("Failed to open link index"),
        ProxyPool::direct(&config.crawler).expect("Failed to build client"),
        LinkNormalizer::new(&config.crawler.seed).expect("Failed to build normalizer"),
    )
}

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><head><title>t</title></head><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(page(body))
        .expect(times)
        .mount(server)
        .await;
}

fn canonical(seed: &str, href: &str) -> CanonicalUrl {
    LinkNormalizer::new(seed)
        .expect("Failed to build normalizer")
        .normalize(href)
        .expect("Link was dropped")
}

#[tokio::test]
async fn test_first_round_stores_page_and_links() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(
        &server,
        "/",
        r#"<a href="/a">A</a> <a href="https://other.test/b?x=1">B</a> <a href="mailto:me@x.test">M</a>"#,
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 1);
    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    let a = canonical(&seed, "/a");
    let b = canonical(&seed, "/b?x=1");
    // Foreign hosts are rewritten onto the seed origin
    assert_eq!(b.as_str(), format!("{}/b?x=1", server.uri()));

    let fetcher = coordinator.fetcher();
    assert_eq!(fetcher.pages().len().unwrap(), 1);
    let root = canonical(&seed, "/");
    let stored = fetcher.links().get(&root.digest()).unwrap().unwrap();
    assert_eq!(stored, LinkSet::from([a, b]));

    assert_eq!(report.rounds.len(), 1);
    assert_eq!(report.rounds[0].fetched, 1);
    assert_eq!(report.rounds[0].next_frontier, 2);
    assert_eq!(report.final_frontier, 2);
}

#[tokio::test]
async fn test_stored_page_is_sanitized_with_provenance() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(
        &server,
        "/",
        r#"<script>var x = 1;</script><style>p {}</style><p>hello</p>"#,
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 1);
    let fetcher = create_fetcher(&config);
    let root = canonical(&seed, "/");
    fetcher.fetch(&root).await.expect("Fetch failed");

    let html = fetcher.pages().get_page(&root).unwrap().unwrap();
    assert!(html.contains("<p>hello</p>"));
    assert!(!html.contains("<script"));
    assert!(!html.contains("<style"));
    assert!(html.contains(&format!(r#"<original_url value="{}""#, root)));
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(&server, "/", r#"<a href="/a">A</a>"#, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 1);
    let fetcher = create_fetcher(&config);
    let root = canonical(&seed, "/");

    let first = fetcher.fetch(&root).await.expect("First fetch failed");
    let second = fetcher.fetch(&root).await.expect("Second fetch failed");

    assert_eq!(first.source, FetchSource::Fetched);
    assert_eq!(second.source, FetchSource::Cached);
    assert_eq!(first.links, second.links);
    assert_eq!(fetcher.pages().len().unwrap(), 1);
    // Wiremock verifies the single GET when the server drops
}

#[tokio::test]
async fn test_error_status_is_not_cached() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 1);
    let fetcher = create_fetcher(&config);
    let root = canonical(&seed, "/");

    let err = fetcher.fetch(&root).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(!err.is_fatal());
    assert!(fetcher.pages().is_empty().unwrap());
    assert!(fetcher.links().is_empty().unwrap());
}

#[tokio::test]
async fn test_connection_refused_is_not_cached() {
    let seed = "http://127.0.0.1:1/";
    let dir = TempDir::new().unwrap();
    let config = create_test_config(seed, &dir, 1);
    let fetcher = create_fetcher(&config);
    let root = canonical(seed, "/");

    let err = fetcher.fetch(&root).await.unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(err.url(), root.as_str());
    assert!(fetcher.pages().is_empty().unwrap());
    assert!(fetcher.links().is_empty().unwrap());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&seed, &dir, 1);
    config.crawler.request_timeout_secs = 1;
    config.crawler.connect_timeout_secs = 1;
    let fetcher = create_fetcher(&config);
    let root = canonical(&seed, "/");

    let err = fetcher.fetch(&root).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
    assert!(fetcher.pages().is_empty().unwrap());
}

#[tokio::test]
async fn test_closed_site_converges() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;
    mount_page(&server, "/a", r#"<a href="/b">B</a><a href="/">home</a>"#, 1).await;
    mount_page(&server, "/b", r#"<a href="/a">A</a>"#, 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&seed, &dir, 4);
    // One worker fetches /a before /b, so /b's links are already stored
    config.crawler.pool_size = 1;

    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.pages_fetched(), 3);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.final_frontier, 0);
    assert!(report.converged());

    let fetcher = coordinator.fetcher();
    let pages = fetcher.pages().digests().unwrap();
    let links = fetcher.links().digests().unwrap();
    let link_sets: Vec<_> = links
        .iter()
        .map(|digest| fetcher.links().get(digest).unwrap())
        .collect();
    assert_eq!(pages.len(), 3);
    assert_eq!(links.len(), 3);

    // Further rounds are served from the stores and leave them unchanged
    let mut rerun = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = rerun.run().await.expect("Rerun failed");
    assert_eq!(report.pages_fetched(), 0);
    assert_eq!(report.failures(), 0);

    let fetcher = rerun.fetcher();
    assert_eq!(fetcher.pages().digests().unwrap(), pages);
    assert_eq!(fetcher.links().digests().unwrap(), links);
    let rerun_sets: Vec<_> = links
        .iter()
        .map(|digest| fetcher.links().get(digest).unwrap())
        .collect();
    assert_eq!(rerun_sets, link_sets);
}

#[tokio::test]
async fn test_fetch_goes_through_configured_proxy() {
    // The mock server plays the forward proxy for a host that does not resolve
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("proxy-authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(page(r#"<a href="/a">A</a>"#))
        .expect(1)
        .mount(&proxy)
        .await;

    let seed = "http://site.invalid/";
    let dir = TempDir::new().unwrap();
    let config = create_test_config(seed, &dir, 1);
    let endpoint = ProxyEndpoint {
        host: proxy.address().ip().to_string(),
        port: proxy.address().port(),
        username: "user".to_string(),
        password: "pass".to_string(),
    };
    let fetcher = Fetcher::new(
        ContentStore::open(&config.storage.pages_dir).unwrap(),
        LinkIndex::open(&config.storage.links_dir).unwrap(),
        ProxyPool::new(&[endpoint], &config.crawler).expect("Failed to build proxy pool"),
        LinkNormalizer::new(seed).unwrap(),
    );

    let outcome = fetcher.fetch(&canonical(seed, "/")).await.expect("Fetch failed");
    assert_eq!(outcome.source, FetchSource::Fetched);
    assert_eq!(outcome.links, LinkSet::from([canonical(seed, "/a")]));
}

#[tokio::test]
async fn test_storage_failure_aborts_crawl() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(&server, "/", r#"<a href="/a">A</a>"#, 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 3);
    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");

    // Pull the pages directory out from under the open store
    std::fs::remove_dir_all(&config.storage.pages_dir).unwrap();
    std::fs::write(&config.storage.pages_dir, b"not a directory").unwrap();

    let err = coordinator.run().await.unwrap_err();
    match err {
        CrawlError::Fetch(e) => {
            assert!(e.is_fatal());
            assert_eq!(e.url(), seed);
        }
        other => panic!("Expected a fetch error, got {:?}", other),
    }
    assert!(coordinator.fetcher().links().is_empty().unwrap());
}

/// Serves every path, recording when each request arrived
struct ArrivalRecorder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
    index: String,
}

impl Respond for ArrivalRecorder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        let body = if request.url.path() == "/" {
            self.index.as_str()
        } else {
            ""
        };
        page(body).set_delay(self.delay)
    }
}

/// Most arrivals that fall within one response delay of each other
///
/// Every response is held for `delay`, so a request arriving within `delay`
/// of another one overlapped with it.
fn peak_in_flight(arrivals: &[Instant], delay: Duration) -> usize {
    arrivals
        .iter()
        .map(|&at| {
            arrivals
                .iter()
                .filter(|&&other| other <= at && at.duration_since(other) < delay)
                .count()
        })
        .max()
        .unwrap_or(0)
}

#[tokio::test]
async fn test_in_flight_fetches_bounded_by_pool_size() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    let index: String = (0..8).map(|i| format!(r#"<a href="/p{}">p</a>"#, i)).collect();
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let delay = Duration::from_millis(200);
    Mock::given(method("GET"))
        .respond_with(ArrivalRecorder {
            arrivals: Arc::clone(&arrivals),
            delay,
            index,
        })
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&seed, &dir, 2);
    config.crawler.pool_size = 2;

    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.pages_fetched(), 9);

    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 9);
    let peak = peak_in_flight(&arrivals, delay);
    assert!(peak >= 1);
    assert!(peak <= config.crawler.pool_size, "peak of {} in flight", peak);
}

#[tokio::test]
async fn test_resumes_from_persisted_link_index() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(&server, "/", "", 0).await;
    mount_page(&server, "/a", "", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 1);

    // Leave behind the link set an interrupted run would have written
    let a = canonical(&seed, "/a");
    let links = LinkIndex::open(&config.storage.links_dir).unwrap();
    links
        .put(&canonical(&seed, "/elsewhere").digest(), &LinkSet::from([a.clone()]))
        .unwrap();

    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    assert_eq!(coordinator.seed_frontier().unwrap(), Frontier::from([a.clone()]));

    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.rounds[0].frontier, 1);
    assert_eq!(report.rounds[0].fetched, 1);
    assert!(coordinator.fetcher().pages().has(&a.digest()));
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    mount_page(&server, "/", r#"<a href="/a">A</a>"#, 1).await;
    mount_page(&server, "/a", "", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&seed, &dir, 3);

    let report = cachecrawl::crawler::crawl(&config).await.expect("Crawl failed");
    assert_eq!(report.rounds.len(), 3);
    assert_eq!(report.pages_fetched(), 2);
    assert_eq!(report.rounds[2].frontier, 0);
}
