use crate::parser::FeedParser;
use crate::types::{DigestError, FetchConfig, Paper, PaperSource, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Client for the arXiv query API.
pub struct ArxivFetcher {
    client: Client,
    config: FetchConfig,
}

impl ArxivFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Request URL for one query, newest submissions first.
    pub fn query_url(&self, query: &str, max_results: usize) -> Result<Url> {
        let max_results = max_results.to_string();
        let url = Url::parse_with_params(
            &self.config.api_url,
            &[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ],
        )?;
        Ok(url)
    }

    /// Fetches and parses one result page, retrying transient failures.
    pub async fn fetch_papers(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let url = self.query_url(query, max_results)?;
        let content = self.fetch_with_retries(url).await?;
        FeedParser::new().parse_feed(&content)
    }

    async fn fetch_with_retries(&self, url: Url) -> Result<String> {
        let start_time = Instant::now();

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            debug!("Requesting {} (attempt {})", url, attempt + 1);

            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    let content = response.text().await?;
                    info!(
                        "Fetched {} bytes from {} in {}ms",
                        content.len(),
                        self.config.api_url,
                        start_time.elapsed().as_millis()
                    );
                    return Ok(content);
                }
                Ok(response) => {
                    let status = response.status();
                    last_error = Some(DigestError::General(format!(
                        "HTTP {}: {}",
                        status,
                        status.canonical_reason().unwrap_or("Unknown")
                    )));
                }
                Err(e) => {
                    last_error = Some(DigestError::Http(e));
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        Err(last_error.unwrap_or_else(|| DigestError::General("Unknown fetch error".to_string())))
    }
}

#[async_trait]
impl PaperSource for ArxivFetcher {
    fn source_name(&self) -> String {
        format!("arXiv ({})", self.config.api_url)
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Vec<Paper> {
        match self.fetch_papers(query, max_results).await {
            Ok(papers) => papers,
            Err(e) => {
                error!("Failed to fetch from arXiv: {}", e);
                Vec::new()
            }
        }
    }
}
