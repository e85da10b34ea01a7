//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end, plus a scripted in-memory transport for the
//! cases where exact request accounting matters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_crawler::config::{CrawlerConfig, UserAgentConfig};
use storefront_crawler::crawler::{CrawlerSettings, FetchError, FetchedPage, Transport};
use storefront_crawler::model::Auth;
use storefront_crawler::progress::CrawlEvent;
use storefront_crawler::storage::{default_key, ResultStore, SqliteResultStore};
use storefront_crawler::{run_crawl, CrawlOutcome, Crawler, ScrapeOptions};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_settings(respect_robots: bool) -> CrawlerSettings {
    CrawlerSettings {
        crawler: CrawlerConfig {
            workers: 4,
            request_timeout_secs: 5,
            minimum_time_between_requests: 0,
            deadline_secs: None,
            respect_robots,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
            contact_email: "bot@example.com".to_string(),
        },
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

fn product_page(name: &str, price: &str) -> ResponseTemplate {
    html(format!(
        r#"<html><head><title>{name}</title>
        <script type="application/ld+json">
        {{"@context": "https://schema.org", "@type": "Product", "name": "{name}",
          "offers": {{"@type": "Offer", "price": "{price}", "priceCurrency": "USD"}}}}
        </script></head><body><a href="/">Home</a></body></html>"#
    ))
}

/// Root links to 3 product pages and 2 category pages; each category page
/// links to 2 deeper product pages that must never be fetched at depth 1.
async fn mount_store(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Test Store</title>
            <meta property="og:site_name" content="Test Store"></head><body>
            <div class="product-card"><a href="/shoes/a">Shoe A</a></div>
            <div class="product-card"><a href="/shoes/b">Shoe B</a></div>
            <div class="product-card"><a href="/shoes/c">Shoe C</a></div>
            <nav><a href="/cat/x">X</a> <a href="/cat/y">Y</a></nav>
            </body></html>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    for (slug, price) in [("a", "10.00"), ("b", "20.00"), ("c", "30.00")] {
        Mock::given(method("GET"))
            .and(path(format!("/shoes/{}", slug)))
            .respond_with(product_page(&format!("Shoe {}", slug.to_uppercase()), price))
            .mount(server)
            .await;
    }

    for (cat, deep) in [("x", ["d", "e"]), ("y", ["f", "g"])] {
        Mock::given(method("GET"))
            .and(path(format!("/cat/{}", cat)))
            .respond_with(html(format!(
                r#"<html><body>
                <div class="product-card"><a href="/shoes/{}">Deep</a></div>
                <div class="product-card"><a href="/shoes/{}">Deep</a></div>
                <a href="/">Home</a></body></html>"#,
                deep[0], deep[1]
            )))
            .mount(server)
            .await;

        for slug in deep {
            Mock::given(method("GET"))
                .and(path(format!("/shoes/{}", slug)))
                .respond_with(product_page("Deep", "99.00"))
                .expect(0)
                .mount(server)
                .await;
        }
    }
}

fn depth_one_options(max_pages: usize) -> ScrapeOptions {
    ScrapeOptions {
        max_depth: 1,
        max_pages_to_visit: max_pages,
        ..ScrapeOptions::default()
    }
}

fn product_names(result: &storefront_crawler::ScrapeResult) -> Vec<String> {
    let mut names: Vec<String> = result.products.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_depth_bounded_crawl_with_room_to_spare() {
    let server = MockServer::start().await;
    mount_store(&server).await;

    let crawler = Crawler::new(test_settings(true), depth_one_options(6)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(result.outcome, CrawlOutcome::Completed);
    assert_eq!(product_names(&result), vec!["Shoe A", "Shoe B", "Shoe C"]);
    assert!(!result.has_more_products);
    assert_eq!(result.total_products_estimate, 3);
    assert_eq!(result.stats.pages_visited, 6);

    let store = result.store_info.unwrap();
    assert_eq!(store.name, "Test Store");
    assert_eq!(store.categories, vec!["shoes".to_string()]);
    assert_eq!(
        store.subcategories["shoes"],
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[tokio::test]
async fn test_page_cap_reports_more_products() {
    let server = MockServer::start().await;
    mount_store(&server).await;

    let crawler = Crawler::new(test_settings(true), depth_one_options(5)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success);
    assert_eq!(result.outcome, CrawlOutcome::CompletedPartial);
    assert_eq!(result.products.len(), 3);
    assert!(result.has_more_products);
    assert_eq!(result.stats.pages_visited, 5);
    assert_eq!(result.stats.urls_dropped_by_limit, 1);
    assert!(result.total_products_estimate >= 3);
}

#[tokio::test]
async fn test_robots_disallowed_pages_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /shoes/c\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shoes/c"))
        .respond_with(product_page("Shoe C", "30.00"))
        .expect(0)
        .named("disallowed product")
        .mount(&server)
        .await;
    mount_store(&server).await;

    let crawler = Crawler::new(test_settings(true), depth_one_options(10)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success);
    assert_eq!(product_names(&result), vec!["Shoe A", "Shoe B"]);
    assert_eq!(result.stats.links_disallowed, 1);
}

#[tokio::test]
async fn test_requests_carry_user_agent_and_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0 (+https://example.com/bot; bot@example.com)",
        ))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(product_page("Members Only", "5.00"))
        .expect(1)
        .mount(&server)
        .await;

    let options = ScrapeOptions {
        auth: Some(Auth::Bearer {
            token: "secret-token".to_string(),
        }),
        ..ScrapeOptions::default()
    };
    let crawler = Crawler::new(test_settings(false), options).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(product_names(&result), vec!["Members Only"]);
}

#[tokio::test]
async fn test_unreachable_root_fails_the_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_settings(false), ScrapeOptions::default()).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(!result.success);
    assert_eq!(result.outcome, CrawlOutcome::Failed);
    assert!(result.error.unwrap().contains("root page"));
    assert!(result.products.is_empty());
}

#[tokio::test]
async fn test_failed_inner_page_is_skipped_and_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><a href="/gone">Gone</a><a href="/shoes/a">A</a></body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shoes/a"))
        .respond_with(product_page("Shoe A", "10.00"))
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_settings(false), ScrapeOptions::default()).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success);
    assert_eq!(result.stats.pages_failed, 1);
    assert_eq!(product_names(&result), vec!["Shoe A"]);
}

/// A second server on `localhost`, out of scope for a crawl seeded on
/// `127.0.0.1`, that must never see a request
async fn foreign_store() -> (MockServer, String) {
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(product_page("Foreign Product", "5.00"))
        .expect(0)
        .mount(&foreign)
        .await;
    let landing = format!("http://localhost:{}/landing", foreign.address().port());
    (foreign, landing)
}

#[tokio::test]
async fn test_redirect_off_domain_is_not_followed() {
    let server = MockServer::start().await;
    let (foreign, landing) = foreign_store().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
            <div class="product-card"><a href="/moved">Moved</a></div>
            <div class="product-card"><a href="/shoes/a">Shoe A</a></div>
            </body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", landing.as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shoes/a"))
        .respond_with(product_page("Shoe A", "10.00"))
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_settings(false), depth_one_options(10)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(product_names(&result), vec!["Shoe A"]);
    assert_eq!(result.stats.pages_failed, 1);
    assert!(result
        .products
        .iter()
        .all(|p| p.detail_url.starts_with("http://127.0.0.1:")));
    assert!(foreign.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_root_redirect_off_domain_fails_the_crawl() {
    let server = MockServer::start().await;
    let (foreign, landing) = foreign_store().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", landing.as_str()))
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_settings(false), depth_one_options(10)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(!result.success);
    assert_eq!(result.outcome, CrawlOutcome::Failed);
    assert!(result.products.is_empty());
    assert!(result.error.unwrap().contains("out of scope"));
    assert!(foreign.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_redirect_within_store_is_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><div class="product-card"><a href="/shoes/old">Old</a></div></body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shoes/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/shoes/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shoes/new"))
        .respond_with(product_page("Shoe New", "15.00"))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(test_settings(false), depth_one_options(10)).unwrap();
    let result = crawler.run(&server.uri()).await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(product_names(&result), vec!["Shoe New"]);
    assert!(result.products[0].detail_url.ends_with("/shoes/new"));
}

#[tokio::test]
async fn test_result_can_be_stored_and_reloaded() {
    let server = MockServer::start().await;
    mount_store(&server).await;

    let crawler = Crawler::new(test_settings(false), depth_one_options(6)).unwrap();
    let result = crawler.run(&server.uri()).await;

    let db = tempfile::NamedTempFile::new().unwrap();
    let key = default_key(&server.uri());
    {
        let mut store = SqliteResultStore::new(db.path()).unwrap();
        store.save(&key, &result, Some("hash")).unwrap();
    }

    let store = SqliteResultStore::new(db.path()).unwrap();
    assert_eq!(store.load(&key).unwrap(), Some(result));
    assert_eq!(store.list().unwrap()[0].product_count, 3);
}

#[tokio::test]
async fn test_run_crawl_rejects_invalid_seed() {
    let result = run_crawl("not a url", ScrapeOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.outcome, CrawlOutcome::Failed);
    assert!(result.error.unwrap().contains("Invalid seed URL"));
}

/// In-memory site: path -> HTML body; everything else is a 404
struct ScriptedTransport {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<Url>>,
    delay: Duration,
}

impl ScriptedTransport {
    fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(p, body)| (p.to_string(), body))
                .collect(),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, _auth: Option<&Auth>) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.pages.get(url.path()) {
            Some(body) if url.host_str() == Some("store.test") => Ok(FetchedPage {
                url: url.clone(),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: body.clone(),
                location: None,
            }),
            _ => Err(FetchError::Http { status: 404 }),
        }
    }
}

fn scripted_crawler(
    transport: ScriptedTransport,
    workers: u32,
    options: ScrapeOptions,
) -> Crawler<ScriptedTransport> {
    let mut settings = test_settings(false);
    settings.crawler.workers = workers;
    Crawler::with_transport(transport, settings, options)
}

fn card(href: &str, name: &str, price: &str) -> String {
    format!(
        r#"<div class="product-card"><h3>{}</h3><span class="price">{}</span><a href="{}">View</a></div>"#,
        name, price, href
    )
}

#[tokio::test]
async fn test_out_of_scope_links_are_never_fetched() {
    let root = r#"<html><body>
        <a href="https://other.test/x">Other</a>
        <a href="https://sub.store.test/y">Sub</a>
        <a href="/about">About</a>
        </body></html>"#
        .to_string();
    let transport = ScriptedTransport::new(vec![
        ("/", root),
        ("/about", "<html><body>About</body></html>".to_string()),
    ]);

    let crawler = scripted_crawler(transport, 2, ScrapeOptions::default());
    let result = crawler.run("https://store.test/").await;

    assert!(result.success);
    assert_eq!(result.stats.links_out_of_scope, 2);
    let calls = crawler.transport().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls
        .iter()
        .all(|url| url.host_str() == Some("store.test")));
}

#[tokio::test]
async fn test_subdomains_in_scope_when_enabled() {
    let root = r#"<html><body><a href="https://eu.store.test/">EU</a></body></html>"#.to_string();
    let transport = ScriptedTransport::new(vec![("/", root)]);
    let options = ScrapeOptions {
        include_subdomains: true,
        ..ScrapeOptions::default()
    };

    let crawler = scripted_crawler(transport, 1, options);
    let result = crawler.run("https://store.test/").await;

    assert_eq!(result.stats.links_out_of_scope, 0);
    assert_eq!(result.stats.pages_failed, 1);
    assert!(crawler
        .transport()
        .calls()
        .iter()
        .any(|url| url.host_str() == Some("eu.store.test")));
}

#[tokio::test]
async fn test_fetch_count_never_exceeds_page_cap() {
    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/page/{}">P{}</a>"#, i, i))
        .collect();
    let mut pages = vec![("/", format!("<html><body>{}</body></html>", links))];
    let bodies: Vec<(String, String)> = (0..20)
        .map(|i| (format!("/page/{}", i), format!("<html><body>{}</body></html>", links)))
        .collect();
    for (p, body) in &bodies {
        pages.push((p.as_str(), body.clone()));
    }
    let transport = ScriptedTransport::new(pages);

    let options = ScrapeOptions {
        max_depth: 5,
        max_pages_to_visit: 5,
        ..ScrapeOptions::default()
    };
    let crawler = scripted_crawler(transport, 3, options);
    let result = crawler.run("https://store.test/").await;

    assert!(result.success);
    assert_eq!(crawler.transport().calls().len(), 5);
    assert_eq!(result.stats.pages_visited, 5);
    assert!(result.has_more_products);
    assert_eq!(result.stats.urls_dropped_by_limit, 16);
}

#[tokio::test]
async fn test_product_cap_and_partial_flag() {
    let cards: String = (0..10)
        .map(|i| card(&format!("/p/{}", i), &format!("Item {}", i), "$5.00"))
        .collect();
    let transport =
        ScriptedTransport::new(vec![("/", format!("<html><body>{}</body></html>", cards))]);

    let options = ScrapeOptions {
        max_products: 3,
        ..ScrapeOptions::default()
    };
    let crawler = scripted_crawler(transport, 2, options);
    let result = crawler.run("https://store.test/").await;

    assert!(result.success);
    assert_eq!(result.products.len(), 3);
    assert!(result.has_more_products);
    assert_eq!(result.outcome, CrawlOutcome::CompletedPartial);
    assert!(result.total_products_estimate >= 10);
    // No page is dispatched once the product cap is exceeded.
    assert_eq!(crawler.transport().calls().len(), 1);
}

#[tokio::test]
async fn test_duplicate_products_first_seen_wins() {
    let root = format!(
        r#"<html><body>{}<a href="/more">More</a></body></html>"#,
        card("/p/1", "First Name", "$10.00")
    );
    let more = format!(
        "<html><body>{}{}</body></html>",
        card("/p/1", "Second Name", "$12.00"),
        card("/p/2", "Other", "$3.00")
    );
    let transport = ScriptedTransport::new(vec![("/", root), ("/more", more)]);

    let options = ScrapeOptions {
        include_product_pages: false,
        ..ScrapeOptions::default()
    };
    let crawler = scripted_crawler(transport, 1, options);
    let result = crawler.run("https://store.test/").await;

    assert_eq!(product_names(&result), vec!["First Name", "Other"]);
    let first = result
        .products
        .iter()
        .find(|p| p.detail_url == "https://store.test/p/1")
        .unwrap();
    assert_eq!(first.price, 10.0);
    assert_eq!(result.stats.duplicate_products, 1);

    let mut ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), result.products.len());
}

#[tokio::test]
async fn test_non_recursive_crawl_only_follows_product_links() {
    let root = format!(
        r#"<html><body>{}<a href="/about">About</a></body></html>"#,
        card("/p/1", "Item", "$1.00")
    );
    let transport = ScriptedTransport::new(vec![("/", root)]);

    let options = ScrapeOptions {
        recursive: false,
        ..ScrapeOptions::default()
    };
    let crawler = scripted_crawler(transport, 1, options);
    crawler.run("https://store.test/").await;

    let paths: Vec<String> = crawler
        .transport()
        .calls()
        .iter()
        .map(|u| u.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/", "/p/1"]);
}

#[tokio::test]
async fn test_cancellation_returns_partial_result() {
    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page/{}">P{}</a>"#, i, i))
        .collect();
    let mut pages = vec![(
        "/",
        format!(
            "<html><body>{}{}</body></html>",
            card("/p/root", "Root Item", "$2.00"),
            links
        ),
    )];
    let bodies: Vec<(String, String)> = (0..10)
        .map(|i| (format!("/page/{}", i), "<html><body></body></html>".to_string()))
        .collect();
    for (p, body) in &bodies {
        pages.push((p.as_str(), body.clone()));
    }
    let transport = ScriptedTransport::new(pages).with_delay(Duration::from_millis(30));

    let token = CancellationToken::new();
    let options = ScrapeOptions {
        include_product_pages: false,
        ..ScrapeOptions::default()
    };
    let crawler = scripted_crawler(transport, 1, options).with_cancellation(token.clone());

    let mut events = crawler.subscribe();
    let completions = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&completions);
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let CrawlEvent::Progress { .. } = event {
                if seen.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    token.cancel();
                }
            }
        }
    });

    let result = crawler.run("https://store.test/").await;

    assert!(result.success);
    assert_eq!(result.outcome, CrawlOutcome::CompletedPartial);
    assert!(result.has_more_products);
    assert_eq!(product_names(&result), vec!["Root Item"]);
    assert!(result.stats.pages_visited >= 2);
    assert!(result.stats.pages_visited < 11);
    assert!(crawler.transport().calls().len() < 11);
}

#[tokio::test]
async fn test_deadline_stops_the_crawl() {
    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page/{}">P{}</a>"#, i, i))
        .collect();
    let transport = ScriptedTransport::new(vec![(
        "/",
        format!("<html><body>{}</body></html>", links),
    )])
    .with_delay(Duration::from_millis(400));

    let mut settings = test_settings(false);
    settings.crawler.workers = 1;
    settings.crawler.deadline_secs = Some(1);
    let crawler = Crawler::with_transport(transport, settings, ScrapeOptions::default());

    let result = tokio::time::timeout(Duration::from_secs(5), crawler.run("https://store.test/"))
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.outcome, CrawlOutcome::CompletedPartial);
    assert!(result.has_more_products);
    assert!(result.stats.pages_visited + result.stats.pages_failed < 11);
}

/// Panics on one path and defers to the scripted pages otherwise
struct PanickingTransport {
    inner: ScriptedTransport,
    panic_path: &'static str,
}

impl Transport for PanickingTransport {
    async fn get(&self, url: &Url, auth: Option<&Auth>) -> Result<FetchedPage, FetchError> {
        if url.path() == self.panic_path {
            panic!("transport broke on {}", url);
        }
        self.inner.get(url, auth).await
    }
}

#[tokio::test]
async fn test_panicked_worker_is_settled_as_failed_page() {
    let root = format!(
        r#"<html><body>{}<a href="/boom">Boom</a></body></html>"#,
        card("/p/1", "Item One", "$4.00")
    );
    let transport = PanickingTransport {
        inner: ScriptedTransport::new(vec![
            ("/", root),
            ("/p/1", "<html><body></body></html>".to_string()),
        ]),
        panic_path: "/boom",
    };
    let crawler = Crawler::with_transport(transport, test_settings(false), ScrapeOptions::default());

    let mut events = crawler.subscribe();
    let result = crawler.run("https://store.test/").await;

    assert!(result.success, "crawl failed: {:?}", result.error);
    assert_eq!(result.outcome, CrawlOutcome::Completed);
    assert_eq!(result.stats.pages_failed, 1);
    assert_eq!(result.total_products_estimate, 1);

    let mut failed = Vec::new();
    let mut last_visited = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            CrawlEvent::PageFailed { url, reason } => failed.push((url, reason)),
            CrawlEvent::Progress { pages_visited, .. } => last_visited = pages_visited,
            _ => {}
        }
    }

    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "https://store.test/boom");
    assert!(failed[0].1.contains("Worker failed"));
    assert_eq!(last_visited, 3);
}
