use axum::{response::Html, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sitechat::config::{Config, CrawlerConfig};
use sitechat::crawler::Crawler;
use sitechat::fetch::Fetcher;
use sitechat::router::QueryRouter;
use sitechat::server::{build_app, AppState};
use sitechat::site::SiteMatcher;
use sitechat::store::DocumentStore;
use sitechat::trainer::Trainer;

const HOME: &str = r#"<html><head><title>Acme</title><script>var tracking = 1;</script></head>
<body>
  <nav>
    <a href="/about">About</a>
    <a href="/pricing">Pricing</a>
    <a href='contact'>Contact</a>
    <a href="https://twitter.com/acme">Twitter</a>
  </nav>
  <p>Welcome to Acme, the home of dependable anvils.</p>
</body></html>"#;

const ABOUT: &str = "<html><body><h1>About</h1><p>Acme has built anvils for cartoon coyotes since 1949.</p></body></html>";

const PRICING: &str = "<html><head><style>p { color: red; }</style></head><body>\
<p>Our pricing plans start at ten dollars per month.</p></body></html>";

const CONTACT: &str = "<html><body><p>Write to the support desk any weekday.</p></body></html>";

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A four-page site with no sitemap.
async fn mock_site() -> SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { Html(HOME) }))
        .route("/about", get(|| async { Html(ABOUT) }))
        .route("/pricing", get(|| async { Html(PRICING) }))
        .route("/contact", get(|| async { Html(CONTACT) }));
    serve(app).await
}

/// A site whose sitemap lists `count` pages.
async fn mock_sitemap_site(count: usize) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let locs: String = (0..count)
        .map(|i| format!("<url><loc>http://{}/page/{}</loc></url>", addr, i))
        .collect();
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        locs
    );

    let app = Router::new()
        .route("/", get(|| async { Html(HOME) }))
        .route(
            "/sitemap.xml",
            get(move || {
                let body = sitemap.clone();
                async move { ([(axum::http::header::CONTENT_TYPE, "application/xml")], body) }
            }),
        );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.timeout_secs = 5;
    config.training.delay_ms = 0;
    config
}

fn crawler(max_urls: usize) -> Crawler {
    let fetcher = Fetcher::new(&CrawlerConfig::default()).unwrap();
    Crawler::new(fetcher, max_urls)
}

fn trainer(config: &Config) -> Trainer {
    let fetcher = Fetcher::new(&config.crawler).unwrap();
    Trainer::new(fetcher, &config.training, &config.fallback).with_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_discover_falls_back_to_home_page_links() {
    let addr = mock_site().await;
    let base = format!("http://{}", addr);

    let urls = crawler(20).discover(&format!("{}/", base)).await;
    assert_eq!(
        urls,
        vec![
            base.clone(),
            format!("{}/about", base),
            format!("{}/pricing", base),
            format!("{}/contact", base),
        ]
    );
}

#[tokio::test]
async fn test_discover_prefers_sitemap() {
    let addr = mock_sitemap_site(3).await;
    let urls = crawler(20).discover(&format!("http://{}", addr)).await;
    assert_eq!(urls.len(), 3);
    assert!(urls.iter().all(|u| u.contains("/page/")));
}

#[tokio::test]
async fn test_discover_caps_at_max_urls() {
    let addr = mock_sitemap_site(30).await;
    let urls = crawler(5).discover(&format!("http://{}", addr)).await;
    assert_eq!(urls.len(), 5);
    assert_eq!(urls[0], format!("http://{}/page/0", addr));
}

#[tokio::test]
async fn test_discover_unreachable_seed_returns_seed() {
    let urls = crawler(20).discover("http://127.0.0.1:1").await;
    assert_eq!(urls, vec!["http://127.0.0.1:1"]);
}

#[tokio::test]
async fn test_train_strips_markup_and_tags_sources() {
    let addr = mock_site().await;
    let config = test_config();
    let store = DocumentStore::new();
    let pricing = format!("http://{}/pricing", addr);

    let report = trainer(&config)
        .train(&store, &[pricing.clone(), format!("http://{}/missing", addr)])
        .await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.chunks, 1);

    let content = store.get_website_content(&pricing);
    assert_eq!(content, vec!["Our pricing plans start at ten dollars per month."]);
    assert_eq!(store.get_websites(), vec![format!("{}/pricing", addr)]);
}

#[tokio::test]
async fn test_scrape_then_ask() {
    let addr = mock_site().await;
    let config = test_config();
    let store = Arc::new(DocumentStore::new());
    store.add_document("stale content from a previous run", "old.example");

    let urls = trainer(&config)
        .scrape_website(&crawler(20), &store, &format!("http://{}", addr))
        .await
        .unwrap();
    assert_eq!(urls.len(), 4);
    assert_eq!(store.get_websites().len(), 4);
    assert!(!store.get_websites().contains(&"old.example".to_string()));

    let joined: String = store.chunks().iter().map(|c| c.content.as_str()).collect();
    assert!(!joined.contains("tracking"));
    assert!(!joined.contains("color: red"));

    let router = QueryRouter::new(store.clone(), SiteMatcher::default());
    let answer = router.ask("How much do the pricing plans cost?").await;
    assert!(
        answer.contains("1. Our pricing plans start at ten dollars per month."),
        "answer: {}",
        answer
    );

    let answer = router.ask("tell me about visafy.com").await;
    assert!(answer.starts_with("I haven't been trained on visafy.com."));
    assert!(answer.contains(&addr.to_string()));
}

#[tokio::test]
async fn test_scrape_unreachable_fallback_site_adds_facts() {
    let mut config = test_config();
    config.fallback.site = "localhost.test".to_string();
    let store = DocumentStore::new();

    let urls = trainer(&config)
        .scrape_website(&crawler(20), &store, "http://localhost:1")
        .await
        .unwrap();
    assert_eq!(urls, vec!["http://localhost:1"]);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get_websites(), vec!["localhost.test"]);
}

// ============ HTTP API ============

async fn api() -> (reqwest::Client, String) {
    let state = AppState::new(&test_config()).unwrap();
    let addr = serve(build_app(state)).await;
    (reqwest::Client::new(), format!("http://{}", addr))
}

#[tokio::test]
async fn test_api_health() {
    let (client, base) = api().await;
    let body: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_api_scrape_ask_and_websites() {
    let site = mock_site().await;
    let (client, base) = api().await;

    let resp = client
        .post(format!("{}/api/scrape", base))
        .json(&json!({ "url": format!("http://{}", site) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["urls"].as_array().unwrap().len(), 4);

    let body: Value = client
        .get(format!("{}/api/websites", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["websites"].as_array().unwrap().len(), 4);

    for path in ["/api/ask", "/ask"] {
        let body: Value = client
            .post(format!("{}{}", base, path))
            .json(&json!({ "question": "When were the anvils first built?" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);
        let answer = body["answer"].as_str().unwrap();
        assert!(answer.contains("since 1949"), "answer: {}", answer);
    }
}

#[tokio::test]
async fn test_api_train_local() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("plan.md"), "The roadmap has four phases.").unwrap();
    std::fs::write(tmp.path().join("logo.png"), [0u8, 1, 2]).unwrap();
    let (client, base) = api().await;

    let body: Value = client
        .post(format!("{}/api/train-local", base))
        .json(&json!({ "dirPath": tmp.path().to_str().unwrap() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["fileCount"], 1);

    let resp = client
        .post(format!("{}/api/train-local", base))
        .json(&json!({ "dirPath": tmp.path().join("missing").to_str().unwrap() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Directory does not exist"));
}

#[tokio::test]
async fn test_api_rejects_bad_requests() {
    let (client, base) = api().await;

    let resp = client
        .post(format!("{}/api/scrape", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "URL is required");

    let resp = client
        .post(format!("{}/api/ask", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "question": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
