pub mod embeddings;
pub mod provider;

pub use embeddings::{EmbeddingClient, EmbeddingError};
pub use provider::{LlmProvider, LlmProviderError, OpenAiCompatProvider};
