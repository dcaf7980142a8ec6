//! Remote KNN search service backend.
//!
//! Speaks an OpenSearch-style JSON API: NDJSON `_bulk` for upserts and a
//! `_search` body with a `knn` clause for queries. Unlike the flat backend
//! the service filters namespaces server-side at query time; the contract
//! observed by callers is the same either way.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{ScoredRecord, VectorIndex, VectorRecord, VectorStoreError};
use crate::model::NodeType;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct RemoteIndex {
    endpoint: String,
    index_name: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: SearchHits,
}

#[derive(Deserialize, Default)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_score")]
    score: f32,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Deserialize)]
struct HitSource {
    id: String,
    #[serde(rename = "type", default)]
    node_type: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Deserialize)]
struct CountResponse {
    #[serde(default)]
    count: usize,
}

impl RemoteIndex {
    pub fn new(endpoint: &str, index_name: &str, api_key: Option<String>) -> Self {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Remote vector index: endpoint={}, index={}",
            endpoint, index_name
        );
        Self {
            endpoint,
            index_name: index_name.to_string(),
            api_key,
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/{}/{path}", self.endpoint, self.index_name));
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    fn bulk_body(&self, records: &[VectorRecord]) -> Result<String, VectorStoreError> {
        let mut lines = Vec::with_capacity(records.len() * 2);
        for record in records {
            lines.push(serde_json::to_string(&serde_json::json!({
                "index": {"_index": self.index_name, "_id": record.id}
            }))?);
            lines.push(serde_json::to_string(&serde_json::json!({
                "id": record.id,
                "type": record.node_type.to_string(),
                "namespace": record.namespace,
                "vector": record.vector,
            }))?);
        }
        Ok(lines.join("\n") + "\n")
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            warn!("No records provided for upsert");
            return Ok(());
        }

        let body = self.bulk_body(&records)?;
        self.request(reqwest::Method::POST, "_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?
            .error_for_status()
            .map_err(VectorStoreError::Http)?;

        info!("Upserted {} vectors (remote)", records.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace_filter: &[String],
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let filter: Vec<serde_json::Value> = if namespace_filter.is_empty() {
            Vec::new()
        } else {
            vec![serde_json::json!({"terms": {"namespace": namespace_filter}})]
        };
        let body = serde_json::json!({
            "size": top_k,
            "query": {
                "bool": {
                    "must": {"knn": {"vector": {"vector": vector, "k": top_k}}},
                    "filter": filter,
                }
            }
        });

        let response: SearchResponse = self
            .request(reqwest::Method::POST, "_search")
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(VectorStoreError::Http)?
            .json()
            .await?;

        Ok(response
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredRecord {
                id: hit.source.id,
                node_type: NodeType::from(hit.source.node_type.as_str()),
                namespace: hit.source.namespace,
                score: hit.score,
            })
            .collect())
    }

    async fn size(&self) -> usize {
        let result: Result<CountResponse, VectorStoreError> = async {
            let response = self
                .request(reqwest::Method::GET, "_count")
                .send()
                .await?
                .error_for_status()
                .map_err(VectorStoreError::Http)?
                .json()
                .await?;
            Ok(response)
        }
        .await;

        match result {
            Ok(count) => count.count,
            Err(e) => {
                warn!("Remote index count failed: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_body_shape() {
        let index = RemoteIndex::new("http://localhost:9200/", "biograph", None);
        let body = index
            .bulk_body(&[VectorRecord {
                id: "GENE_EGFR".to_string(),
                vector: vec![0.1, 0.2],
                node_type: NodeType::Gene,
                namespace: Some("gene".to_string()),
            }])
            .unwrap();

        let lines: Vec<&str> = body.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);
        let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_id"], "GENE_EGFR");
        let doc: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(doc["type"], "Gene");
        assert_eq!(doc["namespace"], "gene");
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let index = RemoteIndex::new("http://localhost:9200///", "idx", None);
        assert_eq!(index.endpoint, "http://localhost:9200");
    }

    #[test]
    fn test_search_response_parsing() {
        let raw = serde_json::json!({
            "hits": {"hits": [
                {"_score": 0.92, "_source": {"id": "PMID_1", "type": "Publication", "namespace": "pub"}},
                {"_score": 0.41, "_source": {"id": "GENE_KRAS", "type": "Gene"}}
            ]}
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].source.id, "PMID_1");
        assert!(parsed.hits.hits[1].source.namespace.is_none());
    }
}
