//! Integration tests for website cloning
//!
//! These tests use wiremock to stand up mock sites (a second server plays the
//! role of a foreign CDN origin) and check the full clone cycle end-to-end:
//! files on disk, rewritten HTML, and statistics.

use scraper::{Html, Selector};
use std::path::Path;
use std::time::{Duration, Instant};
use sumi_mirror::config::Config;
use sumi_mirror::storage::{JsonMetadataStore, MetadataStore};
use sumi_mirror::url::{asset_href, local_asset_path, ASSETS_DIR};
use sumi_mirror::{clone_site, MirrorError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `out`
fn test_config(out: &Path, max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = max_pages;
    config.crawler.concurrency = 4;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.out_dir = Some(out.to_path_buf());
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>t</title></head><body>{}</body></html>",
            body
        ))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Number of requests `server` received for `route`
async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

fn read_document(path: &Path) -> Html {
    let content = std::fs::read_to_string(path).expect("page should be written");
    Html::parse_document(&content)
}

fn attr_values(document: &Html, selector: &str, attribute: &str) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attribute))
        .map(str::to_string)
        .collect()
}

fn asset_files(out: &Path) -> Vec<String> {
    match std::fs::read_dir(out.join(ASSETS_DIR)) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// A two-page site whose home page shows a logo from a second origin
async fn two_page_site() -> (MockServer, MockServer, Url) {
    let site = MockServer::start().await;
    let cdn = MockServer::start().await;
    let logo = Url::parse(&format!("{}/logo.png", cdn.uri())).unwrap();

    mount(
        &site,
        "/",
        html_page(&format!(
            r#"<a href="/about">About</a><img src="{}" loading="lazy" alt="logo">"#,
            logo
        )),
    )
    .await;
    mount(&site, "/about/", html_page(r#"<a href="/">Home</a>"#)).await;
    mount(
        &cdn,
        "/logo.png",
        ResponseTemplate::new(200)
            .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
            .insert_header("content-type", "image/png"),
    )
    .await;

    (site, cdn, logo)
}

#[tokio::test]
async fn test_clone_two_pages_and_external_asset() {
    let (site, _cdn, logo) = two_page_site().await;
    let out = TempDir::new().unwrap();

    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .expect("clone should succeed");

    assert_eq!(result.output_path, out.path());
    assert_eq!(result.statistics.pages_cloned, 2);
    assert_eq!(result.statistics.assets_downloaded, 1);
    assert!(!result.statistics.max_pages_reached);
    assert!(result.statistics.robots_respected);

    assert!(out.path().join("index.html").is_file());
    assert!(out.path().join("about/index.html").is_file());

    let files = asset_files(out.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("-logo.png"));
    assert_eq!(
        std::fs::read(local_asset_path(out.path(), &logo)).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );

    let home = read_document(&out.path().join("index.html"));
    assert_eq!(attr_values(&home, "img", "src"), vec![asset_href(&logo)]);
    assert!(attr_values(&home, "img", "loading").is_empty());
    assert_eq!(attr_values(&home, "a", "href"), vec!["/about/".to_string()]);
}

#[tokio::test]
async fn test_page_budget_of_one() {
    let (site, _cdn, _) = two_page_site().await;
    let out = TempDir::new().unwrap();

    let result = clone_site(&site.uri(), &test_config(out.path(), 1))
        .await
        .unwrap();

    assert_eq!(result.statistics.pages_cloned, 1);
    assert!(result.statistics.max_pages_reached);
    assert!(out.path().join("index.html").is_file());
    assert!(!out.path().join("about").exists());
    assert_eq!(hits(&site, "/about/").await, 0);

    let home = read_document(&out.path().join("index.html"));
    assert_eq!(attr_values(&home, "a", "href"), vec!["/about/".to_string()]);
}

#[tokio::test]
async fn test_missing_asset_does_not_fail_clone() {
    let site = MockServer::start().await;
    mount(
        &site,
        "/",
        html_page(r#"<img src="/present.png"><script src="/missing.js"></script>"#),
    )
    .await;
    mount(
        &site,
        "/present.png",
        ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]),
    )
    .await;
    mount(&site, "/missing.js", ResponseTemplate::new(404)).await;

    let out = TempDir::new().unwrap();
    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .expect("a missing asset is not fatal");

    assert_eq!(result.statistics.pages_cloned, 1);
    assert_eq!(result.statistics.assets_downloaded, 1);
    assert_eq!(result.statistics.assets_failed, 1);

    let missing = Url::parse(&format!("{}/missing.js", site.uri())).unwrap();
    assert!(!local_asset_path(out.path(), &missing).exists());

    let home = read_document(&out.path().join("index.html"));
    assert_eq!(attr_values(&home, "script", "src"), vec![asset_href(&missing)]);
}

#[tokio::test]
async fn test_external_assets_not_mirrored() {
    let site = MockServer::start().await;
    let cdn = MockServer::start().await;
    let stylesheet = Url::parse(&format!("{}/theme.css", cdn.uri())).unwrap();

    mount(
        &site,
        "/",
        html_page(&format!(r#"<link rel="stylesheet" href="{}">"#, stylesheet)),
    )
    .await;
    mount(&cdn, "/theme.css", ResponseTemplate::new(200).set_body_string("body{}")).await;

    let out = TempDir::new().unwrap();
    let mut config = test_config(out.path(), 10);
    config.crawler.mirror_external_assets = false;

    let result = clone_site(&site.uri(), &config).await.unwrap();

    assert_eq!(result.statistics.assets_downloaded, 0);
    assert!(!local_asset_path(out.path(), &stylesheet).exists());
    assert_eq!(hits(&cdn, "/theme.css").await, 0);

    let home = read_document(&out.path().join("index.html"));
    assert_eq!(attr_values(&home, "link", "href"), vec![asset_href(&stylesheet)]);
}

async fn robots_site() -> MockServer {
    let site = MockServer::start().await;
    mount(
        &site,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
    )
    .await;
    mount(
        &site,
        "/",
        html_page(r#"<a href="/private/">Private</a><a href="/public/">Public</a>"#),
    )
    .await;
    mount(&site, "/private/", html_page("secret")).await;
    mount(&site, "/public/", html_page("hello")).await;
    site
}

#[tokio::test]
async fn test_robots_disallow_respected() {
    let site = robots_site().await;
    let out = TempDir::new().unwrap();

    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    assert_eq!(result.statistics.pages_cloned, 2);
    assert!(result.statistics.robots_respected);
    assert_eq!(hits(&site, "/private/").await, 0);
    assert!(!out.path().join("private/index.html").exists());
    assert!(out.path().join("public/index.html").is_file());
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let site = robots_site().await;
    let out = TempDir::new().unwrap();
    let mut config = test_config(out.path(), 10);
    config.crawler.respect_robots = false;

    let result = clone_site(&site.uri(), &config).await.unwrap();

    assert_eq!(result.statistics.pages_cloned, 3);
    assert!(!result.statistics.robots_respected);
    assert_eq!(hits(&site, "/robots.txt").await, 0);
    assert_eq!(hits(&site, "/private/").await, 1);
    assert!(out.path().join("private/index.html").is_file());
}

#[tokio::test]
async fn test_unreachable_robots_is_deterministic() {
    let site = MockServer::start().await;
    mount(&site, "/robots.txt", ResponseTemplate::new(503)).await;
    mount(
        &site,
        "/",
        html_page(r#"<a href="/a/">A</a><img src="/pic.gif">"#),
    )
    .await;
    mount(&site, "/a/", html_page("a")).await;
    mount(&site, "/pic.gif", ResponseTemplate::new(200).set_body_string("GIF89a")).await;

    let out = TempDir::new().unwrap();
    let config = test_config(out.path(), 10);

    let first = clone_site(&site.uri(), &config).await.unwrap();
    let second = clone_site(&site.uri(), &config).await.unwrap();

    assert_eq!(first.statistics, second.statistics);
    assert_eq!(first.statistics.pages_cloned, 2);
    assert_eq!(first.statistics.assets_downloaded, 1);
}

#[tokio::test]
async fn test_crawl_delay_between_pages() {
    let site = MockServer::start().await;
    mount(
        &site,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: TestBot\nCrawl-delay: 1\n"),
    )
    .await;
    mount(&site, "/", html_page(r#"<a href="/next/">next</a>"#)).await;
    mount(&site, "/next/", html_page("done")).await;

    let out = TempDir::new().unwrap();
    let started = Instant::now();
    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    assert_eq!(result.statistics.pages_cloned, 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_image_proxy_urls_are_unwrapped() {
    let site = MockServer::start().await;
    mount(
        &site,
        "/",
        html_page(r#"<img src="/_next/image?url=%2Fimages%2Fhero.jpg&amp;w=640&amp;q=75">"#),
    )
    .await;
    mount(
        &site,
        "/images/hero.jpg",
        ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8]),
    )
    .await;

    let out = TempDir::new().unwrap();
    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    let hero = Url::parse(&format!("{}/images/hero.jpg", site.uri())).unwrap();
    assert_eq!(result.statistics.assets_downloaded, 1);
    assert!(local_asset_path(out.path(), &hero).is_file());
    assert_eq!(hits(&site, "/_next/image").await, 0);

    let home = read_document(&out.path().join("index.html"));
    assert_eq!(attr_values(&home, "img", "src"), vec![asset_href(&hero)]);
}

#[tokio::test]
async fn test_non_html_page_is_skipped() {
    let site = MockServer::start().await;
    mount(
        &site,
        "/",
        html_page(r#"<a href="/feed.xml">Feed</a><a href="/blog/">Blog</a>"#),
    )
    .await;
    mount(
        &site,
        "/feed.xml",
        ResponseTemplate::new(200)
            .set_body_string("<rss/>")
            .insert_header("content-type", "application/rss+xml"),
    )
    .await;
    mount(&site, "/blog/", html_page("posts")).await;

    let out = TempDir::new().unwrap();
    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    assert_eq!(result.statistics.pages_cloned, 2);
    assert_eq!(result.statistics.pages_skipped, 1);
    assert!(!out.path().join("feed.xml").exists());
}

#[tokio::test]
async fn test_output_directory_is_cleared() {
    let site = MockServer::start().await;
    mount(&site, "/", html_page("fresh")).await;

    let out = TempDir::new().unwrap();
    std::fs::create_dir_all(out.path().join("old")).unwrap();
    std::fs::write(out.path().join("old/index.html"), "stale").unwrap();
    std::fs::write(out.path().join("index.html"), "stale").unwrap();

    clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    assert!(!out.path().join("old").exists());
    let home = std::fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(home.contains("fresh"));
}

#[tokio::test]
async fn test_unrelated_directory_is_not_cleared() {
    let site = MockServer::start().await;
    mount(&site, "/", html_page("fresh")).await;

    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("thesis.tex"), "precious").unwrap();

    let err = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::OutputDir { .. }));
    assert!(out.path().join("thesis.tex").is_file());
    assert_eq!(hits(&site, "/").await, 0);
}

#[tokio::test]
async fn test_invalid_target_url() {
    let out = TempDir::new().unwrap();
    let config = test_config(&out.path().join("site"), 10);

    for target in ["not a url", "ftp://example.test/", "mailto:someone@example.test"] {
        let err = clone_site(target, &config).await.unwrap_err();
        assert!(matches!(err, MirrorError::UrlError(_)), "{}: {:?}", target, err);
    }
    assert!(!out.path().join("site").exists());
}

#[tokio::test]
async fn test_metadata_round_trip_after_clone() {
    let (site, _cdn, _) = two_page_site().await;
    let out = TempDir::new().unwrap();

    let result = clone_site(&site.uri(), &test_config(out.path(), 10))
        .await
        .unwrap();

    let store = JsonMetadataStore::new();
    let saved = store.save(&result.output_path, &result).unwrap();
    assert_eq!(saved.statistics, result.statistics);

    let existing = store
        .find_existing(&result.output_path, &result.source_url)
        .expect("clone should be detected");
    assert!(!existing.is_legacy);
    assert_eq!(existing.statistics, Some(result.statistics));
}
