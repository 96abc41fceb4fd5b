use crate::parser::ParseError;

use reqwest::{Client, StatusCode};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Page not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// Sequential HTTP client shared by both house scrapers. Every request is
/// followed by a fixed pause, whatever its outcome.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    delay: Duration,
}

impl HttpClient {
    pub fn new(delay: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, delay })
    }

    pub async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        log::debug!("GET {}", url);
        let result = self.fetch(url).await;
        tokio::time::sleep(self.delay).await;
        result
    }

    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound(url.to_string()));
        }

        Ok(response
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}
