//! Firecrawl hosted rendering service.
//!
//! Renders JavaScript-heavy pages to Markdown (`/v1/scrape`) and maps site
//! links (`/v1/map`). Requires an API key.

use super::CrawlService;
use crate::types::FetchedPage;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use webrag_core::{AppError, AppResult};

const DEFAULT_FIRECRAWL_URL: &str = "https://api.firecrawl.dev";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    only_main_content: bool,
}

#[derive(Debug, Serialize)]
struct MapRequest<'a> {
    url: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Crawl service backed by the Firecrawl API.
pub struct FirecrawlService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirecrawlService {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_FIRECRAWL_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.into(),
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, text));
        }

        response
            .json()
            .await
            .map_err(|e| format!("malformed response: {}", e))
    }
}

#[async_trait::async_trait]
impl CrawlService for FirecrawlService {
    fn name(&self) -> &str {
        "firecrawl"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> AppResult<FetchedPage> {
        let request = ScrapeRequest {
            url,
            formats: ["markdown"],
            only_main_content: true,
        };

        let response: ScrapeResponse = self
            .post("/v1/scrape", &request)
            .await
            .map_err(|e| AppError::Fetch(format!("{}: {}", url, e)))?;

        if !response.success {
            return Err(AppError::Fetch(format!(
                "{}: {}",
                url,
                response.error.unwrap_or_else(|| "scrape unsuccessful".to_string())
            )));
        }

        let data = response.data.unwrap_or(ScrapeData {
            markdown: None,
            metadata: None,
        });

        Ok(FetchedPage {
            markdown: data.markdown,
            title: data.metadata.and_then(|m| m.title),
        })
    }

    #[instrument(skip(self))]
    async fn discover(&self, seed_url: &str, max_count: usize) -> AppResult<Vec<String>> {
        let request = MapRequest {
            url: seed_url,
            limit: max_count,
        };

        let response: MapResponse = self
            .post("/v1/map", &request)
            .await
            .map_err(|e| AppError::Discovery(format!("{}: {}", seed_url, e)))?;

        if !response.success {
            return Err(AppError::Discovery(format!(
                "{}: {}",
                seed_url,
                response.error.unwrap_or_else(|| "map unsuccessful".to_string())
            )));
        }

        debug!("Firecrawl mapped {} links", response.links.len());
        Ok(response.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> FirecrawlService {
        FirecrawlService::new("fc-test", Some(&server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_markdown_and_title() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(header("authorization", "Bearer fc-test"))
            .and(body_json(serde_json::json!({
                "url": "https://a.io/",
                "formats": ["markdown"],
                "onlyMainContent": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "markdown": "# Welcome\n\nHello.",
                    "metadata": {"title": "Home", "sourceURL": "https://a.io/", "statusCode": 200}
                }
            })))
            .mount(&server)
            .await;

        let page = service_for(&server).fetch("https://a.io/").await.unwrap();
        assert_eq!(page.markdown.as_deref(), Some("# Welcome\n\nHello."));
        assert_eq!(page.title.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn test_fetch_without_metadata() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"markdown": "Body only"}
            })))
            .mount(&server)
            .await;

        let page = service_for(&server).fetch("https://a.io/x").await.unwrap();
        assert_eq!(page.markdown.as_deref(), Some("Body only"));
        assert!(page.title.is_none());
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(402).set_body_string("Payment required"))
            .mount(&server)
            .await;

        let err = service_for(&server).fetch("https://a.io/").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
        assert!(err.to_string().contains("402"));
    }

    #[tokio::test]
    async fn test_discover_links() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/map"))
            .and(body_json(serde_json::json!({"url": "https://a.io/", "limit": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "links": ["https://a.io/", "https://a.io/about"]
            })))
            .mount(&server)
            .await;

        let links = service_for(&server)
            .discover("https://a.io/", 20)
            .await
            .unwrap();
        assert_eq!(links, vec!["https://a.io/", "https://a.io/about"]);
    }

    #[tokio::test]
    async fn test_discover_unsuccessful() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/map"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "Rate limit exceeded"
            })))
            .mount(&server)
            .await;

        let err = service_for(&server)
            .discover("https://a.io/", 20)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Discovery(_)));
        assert!(err.to_string().contains("Rate limit exceeded"));
    }
}
