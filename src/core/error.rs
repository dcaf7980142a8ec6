use thiserror::Error;

/// Crate-level error taxonomy.
///
/// Configuration problems are hard errors surfaced at initialization.
/// Upstream fetch failures never reach this type: the fetch layer converts
/// them into empty results at the call site.
#[derive(Error, Debug)]
pub enum BioGraphError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Graph error: {0}")]
    Graph(#[from] crate::graph::GraphError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] crate::vector::VectorStoreError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] crate::llm::EmbeddingError),

    #[error("LLM provider error: {0}")]
    Llm(#[from] crate::llm::LlmProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BioGraphError>;
