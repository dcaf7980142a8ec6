//! BioGraph: biomedical question answering via retrieval and graph
//! expansion.
//!
//! The engine finds seed entities for a question by vector similarity,
//! expands a bounded multi-hop neighborhood around them (from a pre-loaded
//! graph or live biomedical APIs), and formats the merged subgraph into a
//! citation-annotated context for an external language model.

pub mod context;
pub mod core;
pub mod expand;
pub mod fetch;
pub mod graph;
pub mod llm;
pub mod model;
pub mod qa;
pub mod utils;
pub mod vector;

pub use self::core::config::BioGraphConfig;
pub use self::core::error::{BioGraphError, Result};
pub use self::core::state::AppState;
pub use model::{Edge, Node, NodeType, Subgraph};
pub use qa::{answer_question, AnswerBundle};
pub use utils::{safe_truncate, safe_truncate_ellipsis};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

pub const DEFAULT_CACHE_SIZE: usize = 1000;

pub const DEFAULT_CACHE_TTL: u64 = 300;

/// Default config file consulted by the binaries.
pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";
