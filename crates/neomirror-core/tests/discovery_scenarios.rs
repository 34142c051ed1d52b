//! End-to-end discovery and size scenarios against mock sites.
#![allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros, missing_docs)]

use async_trait::async_trait;
use neomirror_core::{
    Confidence, ContentClass, DiscoveryEngine, Error, FetchedBody, Fetcher, HeadInfo, HttpClient,
    HttpSettings, Origin, Result, RunConfig, SizeEstimator,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, depth: u32) -> RunConfig {
    let mut config = RunConfig::new(Origin::resolve(&server.uri()).unwrap());
    config.crawl_depth = depth;
    config.http = HttpSettings {
        timeout: Duration::from_secs(2),
        retries: 0,
        ..HttpSettings::default()
    };
    config
}

fn client_for(config: &RunConfig) -> Arc<Fetcher> {
    Arc::new(Fetcher::with_settings(config.http.clone()).unwrap())
}

async fn serve_html(server: &MockServer, at: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sitemap_and_homepage_merge_into_classified_set() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        "<urlset><url><loc>{base}/a.html</loc></url><url><loc>{base}/b.html</loc></url></urlset>"
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;
    serve_html(&server, "/", r#"<a href="/a.html">A</a><link href="c.css">"#).await;

    let config = config_for(&server, 2);
    let discovery = DiscoveryEngine::new(client_for(&config), &config)
        .discover()
        .await;

    let urls: Vec<&str> = discovery.set.urls().collect();
    let expected = [
        format!("{base}/"),
        format!("{base}/a.html"),
        format!("{base}/b.html"),
        format!("{base}/c.css"),
    ];
    assert_eq!(urls, expected.iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(
        discovery.set.get(&format!("{base}/c.css")).unwrap().class,
        ContentClass::Asset
    );
    for page in ["/", "/a.html", "/b.html"] {
        assert_eq!(
            discovery.set.get(&format!("{base}{page}")).unwrap().class,
            ContentClass::Page,
            "{page}"
        );
    }
    assert_eq!(discovery.confidence, Confidence::Discovered);
}

#[tokio::test]
async fn crawl_cycle_terminates_with_both_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!("<urlset><url><loc>{base}/a.html</loc></url></urlset>");
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve_html(&server, "/a.html", r#"<a href="b.html">to B</a>"#).await;
    serve_html(&server, "/b.html", r#"<a href="a.html">to A</a>"#).await;

    let config = config_for(&server, 2);
    let discovery = DiscoveryEngine::new(client_for(&config), &config)
        .discover()
        .await;

    let urls: Vec<&str> = discovery.set.urls().collect();
    assert_eq!(urls, vec![format!("{base}/a.html"), format!("{base}/b.html")]);
    assert!(!discovery.stats.homepage_reachable);
}

#[tokio::test]
async fn all_sources_failing_still_yields_homepage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config_for(&server, 2);
    let discovery = DiscoveryEngine::new(client_for(&config), &config)
        .discover()
        .await;

    assert_eq!(discovery.confidence, Confidence::Fallback);
    assert!(discovery.set.contains(&config.origin.homepage()));
    assert!(discovery.set.contains(&format!("{}/index.html", server.uri())));
}

/// HEAD responses without a `Content-Length` header.
struct NoLengthClient;

#[async_trait]
impl HttpClient for NoLengthClient {
    async fn get(&self, url: &str) -> Result<FetchedBody> {
        Err(Error::NotFound(url.to_string()))
    }

    async fn head(&self, _url: &str) -> Result<HeadInfo> {
        Ok(HeadInfo {
            status: 200,
            content_length: None,
        })
    }
}

#[tokio::test]
async fn missing_content_length_defaults_to_1024_bytes() {
    let origin = Origin::resolve("example").unwrap();
    let config = RunConfig::new(origin.clone());
    let mut set = neomirror_core::DiscoveredSet::new(origin);
    set.merge(
        [
            "https://example.neocities.org/",
            "https://example.neocities.org/song.mp3",
        ],
        neomirror_core::UrlSource::Sitemap,
    );

    let report = SizeEstimator::new(Arc::new(NoLengthClient), &config)
        .estimate(&mut set)
        .await;

    let song = report.get("https://example.neocities.org/song.mp3").unwrap();
    assert_eq!(song.bytes, 1024);
    assert!(song.defaulted);
    assert_eq!(report.total_bytes(), 2048);
    assert_eq!(report.defaulted_count(), 2);
}

#[tokio::test]
async fn head_content_length_is_used_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/big.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 5000]))
        .mount(&server)
        .await;

    let config = config_for(&server, 0);
    let mut set = neomirror_core::DiscoveredSet::new(config.origin.clone());
    set.merge(
        [format!("{}/big.gif", server.uri())],
        neomirror_core::UrlSource::Crawl,
    );

    let report = SizeEstimator::new(client_for(&config), &config)
        .estimate(&mut set)
        .await;

    let entry = report.get(&format!("{}/big.gif", server.uri())).unwrap();
    assert_eq!(entry.bytes, 5000);
    assert!(!entry.defaulted);
}

#[tokio::test]
async fn redirected_directory_links_resolve_under_the_directory() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve_html(&server, "/", r#"<a href="/blog/">blog</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{base}/blog/")),
        )
        .mount(&server)
        .await;
    serve_html(
        &server,
        "/blog/",
        r#"<a href="post.html">first post</a><img src="cat.png">"#,
    )
    .await;
    serve_html(&server, "/blog/post.html", "<p>hello</p>").await;

    let config = config_for(&server, 1);
    let discovery = DiscoveryEngine::new(client_for(&config), &config)
        .discover()
        .await;

    assert!(discovery.set.contains(&format!("{base}/blog/post.html")));
    assert!(discovery.set.contains(&format!("{base}/blog/cat.png")));
    assert!(!discovery.set.contains(&format!("{base}/post.html")));
    assert!(!discovery.set.contains(&format!("{base}/cat.png")));
    assert_eq!(discovery.stats.pages_crawled, 1);
}
