//! HTTP embedding client.
//!
//! Turns text into fixed-dimension vectors via an Ollama or OpenAI-compatible
//! endpoint. Unlike the biomedical fetch layer, embedding failures propagate:
//! without a query vector the surrounding request cannot proceed.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::EmbeddingConfig;
use crate::utils::safe_truncate_ellipsis;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Unknown embedding provider: {0}")]
    UnknownProvider(String),
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

struct EmbeddingCache {
    entries: Mutex<LruCache<String, (Vec<f32>, Instant)>>,
    ttl: Duration,
}

impl EmbeddingCache {
    fn new(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let mut entries = self.entries.lock();
        match entries.get(text) {
            Some((vector, created)) if created.elapsed() < self.ttl => Some(vector.clone()),
            _ => None,
        }
    }

    fn set(&self, text: &str, vector: Vec<f32>) {
        self.entries
            .lock()
            .put(text.to_string(), (vector, Instant::now()));
    }
}

pub struct EmbeddingClient {
    provider: String,
    url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    cache: EmbeddingCache,
}

impl EmbeddingClient {
    pub fn new(cfg: &EmbeddingConfig) -> Self {
        info!(
            "Embedding client initialized: provider={}, model={}",
            cfg.provider, cfg.model
        );
        Self {
            provider: cfg.provider.to_lowercase(),
            url: cfg.url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            cache: EmbeddingCache::new(cfg.cache_size, cfg.cache_ttl_secs),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if let Some(cached) = self.cache.get(text) {
            debug!("Cache HIT for: {}", safe_truncate_ellipsis(text, 50));
            return Ok(cached);
        }

        let vector = match self.provider.as_str() {
            "ollama" => self.embed_ollama(text).await?,
            "openai" => self.embed_openai(text).await?,
            other => return Err(EmbeddingError::UnknownProvider(other.to_string())),
        };
        self.cache.set(text, vector.clone());
        Ok(vector)
    }

    /// Embed many texts sequentially. Used by the offline index build; any
    /// single failure aborts the batch.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    async fn embed_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaResponse>()
            .await?;
        Ok(response.embedding)
    }

    async fn embed_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;
        let request = OpenAiRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/embeddings", self.url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OpenAiResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let client = EmbeddingClient::new(&EmbeddingConfig::default());
        assert!(matches!(
            client.embed("   ").await,
            Err(EmbeddingError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let cfg = EmbeddingConfig {
            provider: "cohere".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&cfg);
        assert!(matches!(
            client.embed("EGFR").await,
            Err(EmbeddingError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_empty_input_yields_no_vectors() {
        let client = EmbeddingClient::new(&EmbeddingConfig::default());
        assert!(client.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_aborts_on_first_failure() {
        let client = EmbeddingClient::new(&EmbeddingConfig::default());
        let texts = vec!["".to_string(), "EGFR".to_string()];
        assert!(matches!(
            client.embed_batch(&texts).await,
            Err(EmbeddingError::EmptyText)
        ));
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let cache = EmbeddingCache::new(10, 300);
        cache.set("EGFR", vec![1.0, 2.0]);
        assert_eq!(cache.get("EGFR"), Some(vec![1.0, 2.0]));
        assert!(cache.get("TP53").is_none());
    }

    #[test]
    fn test_cache_expired_entry_misses() {
        let cache = EmbeddingCache::new(10, 0);
        cache.set("EGFR", vec![1.0]);
        assert!(cache.get("EGFR").is_none());
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let cache = EmbeddingCache::new(1, 300);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(vec![2.0]));
    }
}
