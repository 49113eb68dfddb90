//! Keyless crawl service: plain HTTP fetches with local HTML extraction.
//!
//! Pages are fetched with reqwest, the main content is located with
//! `scraper` and converted to Markdown with `htmd`. Discovery is a
//! breadth-first walk over same-host links, bounded by a depth ceiling.
//! JavaScript is not executed.

use super::CrawlService;
use crate::types::FetchedPage;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;
use webrag_core::{AppError, AppResult};

const USER_AGENT: &str = concat!("webrag/", env!("CARGO_PKG_VERSION"));

const CONTENT_SELECTORS: [&str; 4] = ["main", "article", r#"[role="main"]"#, "body"];

const SKIPPED_TAGS: [&str; 9] = [
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
];

const BINARY_EXTENSIONS: [&str; 10] = [
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".zip", ".mp4", ".css", ".js",
];

/// HTTP crawl service that needs no API key.
pub struct HttpCrawlService {
    client: Client,
    max_depth: u32,
}

/// What one HTML document yields.
#[derive(Debug, Default)]
struct ParsedPage {
    title: Option<String>,
    markdown: Option<String>,
    links: Vec<Url>,
}

impl HttpCrawlService {
    /// `max_depth` bounds link hops from the seed during discovery.
    pub fn new(timeout: Duration, max_depth: u32) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_depth })
    }

    async fn get_html(&self, url: &Url) -> AppResult<String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("{}: HTTP {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("{}: body read failed: {}", url, e)))
    }
}

#[async_trait::async_trait]
impl CrawlService for HttpCrawlService {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> AppResult<FetchedPage> {
        let page_url = parse_url(url).map_err(AppError::Fetch)?;
        let html = self.get_html(&page_url).await?;
        let parsed = parse_page(&html, &page_url)?;

        debug!(
            title = ?parsed.title,
            markdown_len = parsed.markdown.as_ref().map(|m| m.len()),
            "Extracted page"
        );

        Ok(FetchedPage {
            markdown: parsed.markdown,
            title: parsed.title,
        })
    }

    #[instrument(skip(self))]
    async fn discover(&self, seed_url: &str, max_count: usize) -> AppResult<Vec<String>> {
        let seed = parse_url(seed_url).map_err(AppError::Discovery)?;
        let host = seed.host_str().unwrap_or_default().to_string();

        let mut visited = HashSet::new();
        visited.insert(link_key(&seed));

        let mut found = Vec::new();
        let mut frontier = VecDeque::from([(seed, 0u32)]);

        while let Some((page_url, depth)) = frontier.pop_front() {
            if found.len() >= max_count {
                break;
            }
            if depth >= self.max_depth {
                continue;
            }

            let html = match self.get_html(&page_url).await {
                Ok(html) => html,
                Err(e) if depth == 0 => return Err(AppError::Discovery(e.to_string())),
                Err(e) => {
                    warn!("Discovery skipped {}: {}", page_url, e);
                    continue;
                }
            };

            let links = parse_page(&html, &page_url)
                .map_err(|e| AppError::Discovery(e.to_string()))?
                .links;

            for link in links {
                if link.host_str() != Some(host.as_str()) || !visited.insert(link_key(&link)) {
                    continue;
                }
                found.push(link.to_string());
                frontier.push_back((link, depth + 1));
                if found.len() >= max_count {
                    break;
                }
            }
        }

        debug!("Discovered {} same-host links", found.len());
        Ok(found)
    }
}

fn parse_url(url: &str) -> Result<Url, String> {
    Url::parse(url).map_err(|e| format!("invalid URL '{}': {}", url, e))
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::Other(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Extract title, Markdown body and outgoing links from an HTML document.
fn parse_page(html: &str, page_url: &Url) -> AppResult<ParsedPage> {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "title")?.or(first_text(&doc, "h1")?);

    let mut content_html = None;
    for css in CONTENT_SELECTORS {
        if let Some(el) = doc.select(&selector(css)?).next() {
            content_html = Some(el.inner_html());
            break;
        }
    }

    let markdown = match content_html {
        Some(content) => {
            let converter = htmd::HtmlToMarkdown::builder()
                .skip_tags(SKIPPED_TAGS.to_vec())
                .build();
            let converted = converter
                .convert(&content)
                .map_err(|e| AppError::Fetch(format!("{}: markdown conversion failed: {}", page_url, e)))?;
            Some(converted.trim().to_string()).filter(|m| !m.is_empty())
        }
        None => None,
    };

    let links = extract_links(&doc, page_url)?;

    Ok(ParsedPage {
        title,
        markdown,
        links,
    })
}

fn first_text(doc: &Html, css: &str) -> AppResult<Option<String>> {
    Ok(doc
        .select(&selector(css)?)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Absolute http(s) links without fragments, in document order.
fn extract_links(doc: &Html, base_url: &Url) -> AppResult<Vec<Url>> {
    let mut links = Vec::new();

    for el in doc.select(&selector("a[href]")?) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let Ok(mut resolved) = base_url.join(href) else {
            continue;
        };
        resolved.set_fragment(None);

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let path = resolved.path().to_lowercase();
        if BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            continue;
        }

        links.push(resolved);
    }

    Ok(links)
}

/// Dedup key: trailing slash on the path does not make a new page.
fn link_key(url: &Url) -> String {
    let mut key = url.to_string();
    if key.ends_with('/') && url.path() != "/" {
        key.pop();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME: &str = r#"<!doctype html>
<html><head><title> Acme Docs </title><script>var x = 1;</script></head>
<body>
  <nav><a href="/login">Log in</a></nav>
  <main>
    <h1>Welcome</h1>
    <p>Acme builds <strong>rockets</strong>.</p>
    <a href="/pricing">Pricing</a>
    <a href="/about#team">About</a>
    <a href="https://elsewhere.com/">Partner</a>
    <a href="/brochure.pdf">Brochure</a>
    <a href="mailto:hi@acme.test">Mail</a>
  </main>
  <footer>Copyright</footer>
</body></html>"#;

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_page_extracts_main_content() {
        let base = Url::parse("https://acme.test/").unwrap();
        let parsed = parse_page(HOME, &base).unwrap();

        assert_eq!(parsed.title.as_deref(), Some("Acme Docs"));
        let markdown = parsed.markdown.unwrap();
        assert!(markdown.contains("Welcome"));
        assert!(markdown.contains("**rockets**"));
        assert!(!markdown.contains("Copyright"));
        assert!(!markdown.contains("var x"));
    }

    #[test]
    fn test_extract_links_resolves_and_filters() {
        let base = Url::parse("https://acme.test/").unwrap();
        let parsed = parse_page(HOME, &base).unwrap();
        let links: Vec<String> = parsed.links.iter().map(|u| u.to_string()).collect();

        assert_eq!(
            links,
            vec![
                "https://acme.test/login",
                "https://acme.test/pricing",
                "https://acme.test/about",
                "https://elsewhere.com/",
            ]
        );
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let base = Url::parse("https://acme.test/").unwrap();
        let parsed = parse_page("<html><body><h1>Only heading</h1></body></html>", &base).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Only heading"));
    }

    #[tokio::test]
    async fn test_fetch_from_server() {
        let server = MockServer::start().await;
        serve(&server, "/", HOME).await;

        let service = HttpCrawlService::new(Duration::from_secs(5), 2).unwrap();
        let page = service.fetch(&format!("{}/", server.uri())).await.unwrap();

        assert_eq!(page.title.as_deref(), Some("Acme Docs"));
        assert!(page.markdown.unwrap().contains("rockets"));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = HttpCrawlService::new(Duration::from_secs(5), 2).unwrap();
        let err = service
            .fetch(&format!("{}/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_discover_walks_same_host_breadth_first() {
        let server = MockServer::start().await;
        let root = server.uri();
        serve(
            &server,
            "/",
            r#"<html><body><a href="/a">A</a><a href="/b">B</a><a href="https://other.test/">X</a></body></html>"#,
        )
        .await;
        serve(&server, "/a", r#"<html><body><a href="/a/deep">Deep</a><a href="/">Home</a></body></html>"#).await;
        serve(&server, "/b", r#"<html><body><a href="/b/deep">Deep</a></body></html>"#).await;

        let service = HttpCrawlService::new(Duration::from_secs(5), 2).unwrap();
        let links = service.discover(&format!("{}/", root), 20).await.unwrap();

        assert_eq!(
            links,
            vec![
                format!("{}/a", root),
                format!("{}/b", root),
                format!("{}/a/deep", root),
                format!("{}/b/deep", root),
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_respects_depth_and_count() {
        let server = MockServer::start().await;
        let root = server.uri();
        serve(
            &server,
            "/",
            r#"<html><body><a href="/a">A</a><a href="/b">B</a><a href="/c">C</a></body></html>"#,
        )
        .await;

        let shallow = HttpCrawlService::new(Duration::from_secs(5), 1).unwrap();
        let links = shallow.discover(&format!("{}/", root), 2).await.unwrap();
        assert_eq!(links, vec![format!("{}/a", root), format!("{}/b", root)]);
    }

    #[tokio::test]
    async fn test_discover_fails_when_seed_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = HttpCrawlService::new(Duration::from_secs(5), 2).unwrap();
        let err = service
            .discover(&format!("{}/", server.uri()), 20)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Discovery(_)));
    }
}
