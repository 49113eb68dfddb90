//! Website crawling: fetch the seed page, discover linked pages, chunk them.
//!
//! The crawl service (hosted renderer or plain HTTP) sits behind
//! [`CrawlService`]. [`WebsiteCrawler`] owns the policy: page budget,
//! exclusions, rate-limit delay, and per-page failure isolation.

pub mod filter;
pub mod firecrawl;
pub mod http;

pub use filter::UrlFilter;
pub use firecrawl::FirecrawlService;
pub use http::HttpCrawlService;

use crate::chunker::Chunker;
use crate::progress::ProgressReporter;
use crate::types::{Chunk, FetchedPage, UNTITLED};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use webrag_core::{AppError, AppResult, CrawlSettings};

/// A service that renders pages and maps sites.
#[async_trait::async_trait]
pub trait CrawlService: Send + Sync {
    /// Service name for logs (e.g. "firecrawl", "http").
    fn name(&self) -> &str;

    /// Fetch one page as Markdown.
    async fn fetch(&self, url: &str) -> AppResult<FetchedPage>;

    /// List up to `max_count` URLs linked from the site at `seed_url`.
    async fn discover(&self, seed_url: &str, max_count: usize) -> AppResult<Vec<String>>;
}

/// Crawl scope and pacing.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Page budget including the seed
    pub max_pages: usize,

    /// Pause before each discovered page
    pub page_delay: Duration,

    /// URLs never fetched
    pub exclude: UrlFilter,
}

impl CrawlOptions {
    pub fn from_settings(settings: &CrawlSettings) -> AppResult<Self> {
        Ok(Self {
            max_pages: settings.max_pages,
            page_delay: Duration::from_millis(settings.page_delay_ms),
            exclude: UrlFilter::new(&settings.exclude_patterns)?,
        })
    }
}

/// Turns a seed URL into page chunks.
pub struct WebsiteCrawler {
    service: Arc<dyn CrawlService>,
    chunker: Chunker,
    options: CrawlOptions,
    progress: ProgressReporter,
}

impl WebsiteCrawler {
    pub fn new(service: Arc<dyn CrawlService>, chunker: Chunker, options: CrawlOptions) -> Self {
        Self {
            service,
            chunker,
            options,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Crawl the site at `seed_url`.
    ///
    /// A seed fetch failure is returned as [`AppError::Fetch`]. Discovery
    /// failure keeps the seed chunks. A failing discovered page is skipped.
    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn crawl(&self, seed_url: &str) -> AppResult<Vec<Chunk>> {
        info!("Crawling {}", seed_url);

        let seed_page = self.service.fetch(seed_url).await.map_err(|e| {
            error!("Failed to fetch seed page {}: {}", seed_url, e);
            match e {
                AppError::Fetch(_) => e,
                other => AppError::Fetch(format!("{}: {}", seed_url, other)),
            }
        })?;

        let mut chunks = self.chunk_fetched(seed_url, seed_page, 0);
        info!("Created {} chunks from seed page", chunks.len());
        self.progress.crawl(1, None, seed_url);

        let discovered = match self
            .service
            .discover(seed_url, self.options.max_pages)
            .await
        {
            Ok(urls) => urls,
            Err(e) => {
                warn!("URL discovery failed, keeping seed page only: {}", e);
                return Ok(chunks);
            }
        };

        let pages = self.select_pages(seed_url, discovered);
        info!("Crawling {} discovered pages", pages.len());
        let total = pages.len() as u64 + 1;

        for (i, url) in pages.iter().enumerate() {
            if !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }

            match self.service.fetch(url).await {
                Ok(page) => {
                    let page_chunks = self.chunk_fetched(url, page, i as u32 + 1);
                    info!("Added {} chunks from {}", page_chunks.len(), url);
                    chunks.extend(page_chunks);
                }
                Err(e) => warn!("Skipping {}: {}", url, e),
            }

            self.progress.crawl(i as u64 + 2, Some(total), url);
        }

        info!("Crawl produced {} chunks", chunks.len());
        Ok(chunks)
    }

    /// Apply the page budget and exclusions to discovered URLs, keeping order.
    pub fn select_pages(&self, seed_url: &str, discovered: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        seen.insert(normalize(seed_url));

        discovered
            .into_iter()
            .filter(|url| seen.insert(normalize(url)))
            .filter(|url| !self.options.exclude.is_excluded(url))
            .take(self.options.max_pages.saturating_sub(1))
            .collect()
    }

    fn chunk_fetched(&self, url: &str, page: FetchedPage, page_index: u32) -> Vec<Chunk> {
        let Some(markdown) = page.markdown.filter(|m| !m.trim().is_empty()) else {
            warn!("No content returned for {}", url);
            return Vec::new();
        };

        let title = page
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        self.chunker.chunk_page(url, &title, page_index, &markdown)
    }
}

/// Comparison key for URLs: no fragment, no trailing slash.
fn normalize(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Crawl service answering from a fixed table.
    struct TableService {
        pages: HashMap<String, AppResult<FetchedPage>>,
        links: Option<Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl TableService {
        fn new(links: Option<Vec<&str>>) -> Self {
            Self {
                pages: HashMap::new(),
                links: links.map(|l| l.into_iter().map(String::from).collect()),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn page(mut self, url: &str, page: FetchedPage) -> Self {
            self.pages.insert(url.to_string(), Ok(page));
            self
        }

        fn failing(mut self, url: &str) -> Self {
            self.pages
                .insert(url.to_string(), Err(AppError::Fetch("HTTP 500".to_string())));
            self
        }
    }

    #[async_trait::async_trait]
    impl CrawlService for TableService {
        fn name(&self) -> &str {
            "table"
        }

        async fn fetch(&self, url: &str) -> AppResult<FetchedPage> {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(AppError::Fetch(e.to_string())),
                None => Err(AppError::Fetch(format!("{} not found", url))),
            }
        }

        async fn discover(&self, _seed_url: &str, max_count: usize) -> AppResult<Vec<String>> {
            match &self.links {
                Some(links) => Ok(links.iter().take(max_count).cloned().collect()),
                None => Err(AppError::Discovery("map endpoint unavailable".to_string())),
            }
        }
    }

    fn crawler(service: TableService, max_pages: usize) -> (WebsiteCrawler, Arc<TableService>) {
        let service = Arc::new(service);
        let options = CrawlOptions {
            max_pages,
            page_delay: Duration::ZERO,
            exclude: UrlFilter::new(&["*/login*"]).unwrap(),
        };
        let crawler = WebsiteCrawler::new(
            service.clone(),
            Chunker::new(500, 50).unwrap(),
            options,
        );
        (crawler, service)
    }

    #[tokio::test]
    async fn test_crawl_indexes_pages_in_discovery_order() {
        let service = TableService::new(Some(vec![
            "https://a.io/",
            "https://a.io/about",
            "https://a.io/login",
            "https://a.io/about#team",
            "https://a.io/pricing",
        ]))
        .page("https://a.io/", FetchedPage::new("Welcome home.", "Home"))
        .page("https://a.io/about", FetchedPage::new("About us.", "About"))
        .page("https://a.io/pricing", FetchedPage::new("Ten dollars.", "Pricing"));

        let (crawler, service) = crawler(service, 20);
        let chunks = crawler.crawl("https://a.io/").await.unwrap();

        let pages: Vec<(u32, &str)> = chunks
            .iter()
            .map(|c| (c.metadata.page_index, c.metadata.source_url.as_str()))
            .collect();
        assert_eq!(
            pages,
            vec![
                (0, "https://a.io/"),
                (1, "https://a.io/about"),
                (2, "https://a.io/pricing"),
            ]
        );
        assert!(!service
            .fetched
            .lock()
            .unwrap()
            .contains(&"https://a.io/login".to_string()));
    }

    #[tokio::test]
    async fn test_page_budget_includes_seed() {
        let service = TableService::new(Some(vec![
            "https://a.io/1",
            "https://a.io/2",
            "https://a.io/3",
        ]))
        .page("https://a.io/", FetchedPage::new("Seed.", "Home"))
        .page("https://a.io/1", FetchedPage::new("One.", "1"))
        .page("https://a.io/2", FetchedPage::new("Two.", "2"))
        .page("https://a.io/3", FetchedPage::new("Three.", "3"));

        let (crawler, service) = crawler(service, 2);
        let chunks = crawler.crawl("https://a.io/").await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(service.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let service = TableService::new(Some(vec!["https://a.io/broken", "https://a.io/ok"]))
            .page("https://a.io/", FetchedPage::new("Seed.", "Home"))
            .failing("https://a.io/broken")
            .page("https://a.io/ok", FetchedPage::new("Fine.", "Ok"));

        let (crawler, _) = crawler(service, 20);
        let chunks = crawler.crawl("https://a.io/").await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].metadata.source_url, "https://a.io/ok");
        assert_eq!(chunks[1].metadata.page_index, 2);
    }

    #[tokio::test]
    async fn test_missing_title_and_content_defaults() {
        let service = TableService::new(Some(vec!["https://a.io/empty"]))
            .page(
                "https://a.io/",
                FetchedPage {
                    markdown: Some("Seed text.".to_string()),
                    title: None,
                },
            )
            .page("https://a.io/empty", FetchedPage::default());

        let (crawler, _) = crawler(service, 20);
        let chunks = crawler.crawl("https://a.io/").await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.title, "Untitled");
    }

    #[tokio::test]
    async fn test_seed_failure_is_a_fetch_error() {
        let service = TableService::new(Some(vec![])).failing("https://a.io/");

        let (crawler, _) = crawler(service, 20);
        let err = crawler.crawl("https://a.io/").await.unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_empty_seed_still_discovers() {
        let service = TableService::new(Some(vec!["https://a.io/docs"]))
            .page("https://a.io/", FetchedPage::default())
            .page("https://a.io/docs", FetchedPage::new("Docs.", "Docs"));

        let (crawler, _) = crawler(service, 20);
        let chunks = crawler.crawl("https://a.io/").await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.page_index, 1);
    }

    #[test]
    fn test_select_pages() {
        let (crawler, _) = crawler(TableService::new(None), 3);
        let selected = crawler.select_pages(
            "https://a.io",
            vec![
                "https://a.io/".to_string(),
                "https://a.io/x".to_string(),
                "https://a.io/x/".to_string(),
                "https://a.io/login".to_string(),
                "https://a.io/y".to_string(),
                "https://a.io/z".to_string(),
            ],
        );

        assert_eq!(selected, vec!["https://a.io/x", "https://a.io/y"]);
    }
}
