use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::core::error::{BioGraphError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Node/edge JSON for the local graph backend.
    pub sample_graph: String,
    /// File stem for the flat vector index companion files.
    pub vector_index: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sample_graph: "data/local/sample_graph.json".to_string(),
            vector_index: "data/embeddings/vector.index".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// "flat" (embedded, in-process) or "remote" (KNN search service).
    pub backend: String,
    pub dimension: usize,
    /// Remote backend only.
    pub endpoint: String,
    pub index_name: String,
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: "flat".to_string(),
            dimension: 768,
            endpoint: String::new(),
            index_name: "biograph".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub hops: usize,
    pub max_degree: usize,
    /// Node cap handed to the live graph builder.
    pub prune_max_nodes: usize,
    /// Namespace include-filter for vector queries; empty means all.
    pub namespaces: Vec<String>,
    /// "local" (pre-loaded graph) or "live" (per-request API graph).
    pub graph_backend: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            hops: 2,
            max_degree: 10,
            prune_max_nodes: 40,
            namespaces: Vec::new(),
            graph_backend: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrezConfig {
    /// Contact email sent with every E-utilities call, per NCBI policy.
    pub email: String,
    pub api_key: Option<String>,
    /// Minimum gap between outbound calls. NCBI allows 3 req/s without a key.
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            api_key: None,
            min_interval_ms: 340,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai".
    pub provider: String,
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            url: crate::DEFAULT_OLLAMA_URL.to_string(),
            model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            cache_size: crate::DEFAULT_CACHE_SIZE,
            cache_ttl_secs: crate::DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Any OpenAI-compatible chat endpoint (Groq by default).
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: crate::DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

/// Top-level configuration, layered from an optional TOML file and
/// `BIOGRAPH_`-prefixed environment variables (`__` as section separator,
/// e.g. `BIOGRAPH_RETRIEVAL__TOP_K=5`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BioGraphConfig {
    pub paths: PathsConfig,
    pub vector_store: VectorStoreConfig,
    pub retrieval: RetrievalConfig,
    pub entrez: EntrezConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

impl BioGraphConfig {
    /// Load from `path` (missing file falls back to defaults) with env
    /// overrides applied on top, then validate.
    pub fn load(path: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("BIOGRAPH").separator("__"))
            .build()
            .map_err(|e| BioGraphError::Configuration(e.to_string()))?;

        let cfg: Self = cfg
            .try_deserialize()
            .map_err(|e| BioGraphError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fail fast on settings that would otherwise surface as confusing
    /// runtime behavior. Never silently defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.vector_store.dimension == 0 {
            return Err(BioGraphError::Configuration(
                "vector_store.dimension must be greater than zero".to_string(),
            ));
        }
        match self.vector_store.backend.as_str() {
            "flat" | "remote" => {}
            other => {
                return Err(BioGraphError::Configuration(format!(
                    "unknown vector_store.backend '{other}' (expected 'flat' or 'remote')"
                )));
            }
        }
        if self.vector_store.backend == "remote" && self.vector_store.endpoint.is_empty() {
            return Err(BioGraphError::Configuration(
                "vector_store.endpoint is required for the remote backend".to_string(),
            ));
        }
        match self.retrieval.graph_backend.as_str() {
            "local" | "live" => {}
            other => {
                return Err(BioGraphError::Configuration(format!(
                    "unknown retrieval.graph_backend '{other}' (expected 'local' or 'live')"
                )));
            }
        }
        Ok(())
    }
}
