//! Embedded exact-scan vector index.
//!
//! Cosine similarity via inner product over L2-normalized vectors. The
//! whole index lives in memory and persists to two companion files derived
//! from one configured stem: `<stem>.vectors.bin` (u32 little-endian
//! dimension header followed by packed f32 rows) and `<stem>.meta.json`
//! (one id/type/namespace row per vector, same order). Saves replace both
//! files wholesale via a temp-file rename.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ScoredRecord, VectorIndex, VectorRecord, VectorStoreError};
use crate::model::NodeType;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetaRow {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    namespace: Option<String>,
}

#[derive(Default)]
struct FlatInner {
    /// Row-major packed vectors, `meta.len() * dimension` floats.
    vectors: Vec<f32>,
    meta: Vec<MetaRow>,
}

pub struct FlatIndex {
    dimension: usize,
    vectors_path: PathBuf,
    meta_path: PathBuf,
    inner: RwLock<FlatInner>,
}

impl FlatIndex {
    /// Open the index at `stem`, loading the companion files when both
    /// exist and starting empty otherwise. A persisted dimension that does
    /// not match the configured one is a hard error, never silently
    /// re-dimensioned.
    pub fn open(stem: &str, dimension: usize) -> Result<Self, VectorStoreError> {
        let vectors_path = companion_path(stem, "vectors.bin");
        let meta_path = companion_path(stem, "meta.json");

        let inner = if vectors_path.exists() && meta_path.exists() {
            let loaded = load_files(&vectors_path, &meta_path, dimension)?;
            info!(
                "Loaded flat vector index: {} vectors, dim={}",
                loaded.meta.len(),
                dimension
            );
            loaded
        } else {
            FlatInner::default()
        };

        Ok(Self {
            dimension,
            vectors_path,
            meta_path,
            inner: RwLock::new(inner),
        })
    }

    fn save(&self, inner: &FlatInner) -> Result<(), VectorStoreError> {
        if let Some(parent) = self.vectors_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut bytes = Vec::with_capacity(4 + inner.vectors.len() * 4);
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        for value in &inner.vectors {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        write_replace(&self.vectors_path, &bytes)?;

        let meta_json = serde_json::to_vec(&inner.meta)?;
        write_replace(&self.meta_path, &meta_json)?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            warn!("No records provided for upsert");
            return Ok(());
        }

        let mut inner = self.inner.write();
        for record in records {
            if record.vector.len() != self.dimension {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.vector.len(),
                });
            }
            inner.vectors.extend(l2_normalize(&record.vector));
            inner.meta.push(MetaRow {
                id: record.id,
                node_type: record.node_type,
                namespace: record.namespace,
            });
        }

        self.save(&inner)?;
        info!("Upserted vectors, index size now {}", inner.meta.len());
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace_filter: &[String],
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let inner = self.inner.read();
        if inner.meta.is_empty() {
            return Ok(Vec::new());
        }

        let query = l2_normalize(vector);
        let mut scored: Vec<(usize, f32)> = inner
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, chunk)| (row, dot(&query, chunk)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        // Namespace filtering happens after the candidate search, so a
        // restrictive filter may legitimately return fewer than top_k rows.
        let results = scored
            .into_iter()
            .filter_map(|(row, score)| {
                let meta = &inner.meta[row];
                if !namespace_filter.is_empty() {
                    match &meta.namespace {
                        Some(ns) if namespace_filter.contains(ns) => {}
                        _ => return None,
                    }
                }
                Some(ScoredRecord {
                    id: meta.id.clone(),
                    node_type: meta.node_type.clone(),
                    namespace: meta.namespace.clone(),
                    score,
                })
            })
            .collect();
        Ok(results)
    }

    async fn size(&self) -> usize {
        self.inner.read().meta.len()
    }
}

fn companion_path(stem: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{stem}.{suffix}"))
}

fn load_files(
    vectors_path: &Path,
    meta_path: &Path,
    dimension: usize,
) -> Result<FlatInner, VectorStoreError> {
    let bytes = fs::read(vectors_path)?;
    if bytes.len() < 4 || (bytes.len() - 4) % 4 != 0 {
        return Err(VectorStoreError::InvalidResponse(format!(
            "corrupt vector file {}",
            vectors_path.display()
        )));
    }
    let stored_dim = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if stored_dim != dimension {
        return Err(VectorStoreError::DimensionMismatch {
            expected: dimension,
            actual: stored_dim,
        });
    }

    let vectors: Vec<f32> = bytes[4..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let meta: Vec<MetaRow> = serde_json::from_slice(&fs::read(meta_path)?)?;
    if meta.len() * dimension != vectors.len() {
        return Err(VectorStoreError::InvalidResponse(format!(
            "vector/metadata length mismatch: {} rows vs {} floats",
            meta.len(),
            vectors.len()
        )));
    }

    Ok(FlatInner { vectors, meta })
}

/// Write via a temp file and rename so readers never observe a partial
/// index on disk.
fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), VectorStoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt() + 1e-12;
    vector.iter().map(|v| v / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
