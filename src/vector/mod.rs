//! Vector similarity index over node embeddings.
//!
//! Two interchangeable backends sit behind [`VectorIndex`]: an embedded
//! flat index held fully in process memory ([`flat::FlatIndex`]) and a
//! remote KNN search service ([`remote::RemoteIndex`]). The backend is a
//! constructor-time decision resolved once from config; callers must not
//! depend on which one is active.

pub mod flat;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{PathsConfig, VectorStoreConfig};
use crate::model::NodeType;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One indexed embedding. `id` matches a node id; `namespace` is an
/// optional grouping key for filtered queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub node_type: NodeType,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: String,
    pub node_type: NodeType,
    pub namespace: Option<String>,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append records to the index. Ids are not deduplicated at this layer;
    /// duplicate ids produce duplicate entries. Writes are infrequent,
    /// offline, administrative operations.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    /// Top-k nearest neighbors by descending similarity, ties broken by
    /// insertion order. A non-empty `namespace_filter` excludes non-matching
    /// rows from the returned list after the candidate search, so a
    /// restrictive filter can return fewer than `top_k` rows.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace_filter: &[String],
    ) -> Result<Vec<ScoredRecord>, VectorStoreError>;

    async fn size(&self) -> usize;
}

/// Resolve the configured backend once. Unknown names were already rejected
/// by config validation.
pub fn build_index(
    store: &VectorStoreConfig,
    paths: &PathsConfig,
) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    match store.backend.as_str() {
        "remote" => Ok(Arc::new(remote::RemoteIndex::new(
            &store.endpoint,
            &store.index_name,
            store.api_key.clone(),
        ))),
        _ => Ok(Arc::new(flat::FlatIndex::open(
            &paths.vector_index,
            store.dimension,
        )?)),
    }
}
