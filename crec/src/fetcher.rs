use crate::config::FetchConfig;
use crate::types::{CrecError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// HTTP client shared by every pull-based provider of a service.
///
/// Each request carries its own timeout, so a stalled provider can only
/// delay its own task within a refresh cycle.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `url`, retrying failed attempts with exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let start_time = Instant::now();
        let url = url::Url::parse(url)?;
        debug!("Fetching content: {}", url);

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
            match self.fetch_once(url.as_str()).await {
                Ok(body) => {
                    info!(
                        "Fetched {} ({} bytes) in {}ms",
                        url,
                        body.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(body);
                }
                // oversized responses will not shrink on retry
                Err(e @ CrecError::TooLarge { .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        error!(
            "Failed to fetch after {} attempts: {}",
            self.config.max_retries + 1,
            url
        );
        Err(last_error.unwrap_or_else(|| CrecError::General(format!("Failed to fetch {}", url))))
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let response: Response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CrecError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(content_length) = response.content_length() {
            self.check_size(content_length as usize)?;
        }

        let body = response.bytes().await?;
        self.check_size(body.len())?;
        Ok(body.to_vec())
    }

    fn check_size(&self, bytes: usize) -> Result<()> {
        let limit = self.config.max_content_size_mb * 1024 * 1024;
        if bytes > limit {
            return Err(CrecError::TooLarge {
                size_mb: bytes / (1024 * 1024),
            });
        }
        Ok(())
    }
}
