//! Rate-limited HTTP client for public biomedical APIs.
//!
//! All outbound calls are serialized through one rolling timestamp: each
//! caller waits out the remainder of the minimum interval while holding the
//! gate, so the sustained rate is exactly `1 / min_interval` with no bursts
//! regardless of how many tasks are calling concurrently.

use std::time::{Duration, Instant};

use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub struct RateLimitedClient {
    client: Client,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimitedClient {
    /// `timeout` is the fixed total deadline per call; exceeding it surfaces
    /// as a [`FetchError::Http`] like any other transport failure. No
    /// automatic retries.
    pub fn new(min_interval: Duration, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Block until this caller's turn at the rate gate, then stamp it.
    /// Callers queue on the internal lock; the wait happens inside it so the
    /// gap between consecutive stamps is never below `min_interval`.
    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, FetchError> {
        self.wait_turn().await;
        let value = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()
            .map_err(FetchError::Http)?
            .json::<serde_json::Value>()
            .await?;
        Ok(value)
    }

    pub async fn get_text(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, FetchError> {
        self.wait_turn().await;
        let body = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()
            .map_err(FetchError::Http)?
            .text()
            .await?;
        Ok(body)
    }
}
