//! Process-wide lazily-initialized singletons.
//!
//! The loaded graph, the vector index, the embedding client and the graph
//! backend are populated on first access and held for the process lifetime,
//! shared read-only across concurrent requests. Concurrent first accesses
//! converge to a single initialization; losers' work is discarded.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::core::config::BioGraphConfig;
use crate::core::error::Result;
use crate::expand::GraphBackend;
use crate::fetch::EntrezClient;
use crate::graph::{LiveGraphBuilder, LocalGraph};
use crate::llm::EmbeddingClient;
use crate::vector::{self, VectorIndex};

pub struct AppState {
    config: BioGraphConfig,
    graph: OnceCell<Arc<LocalGraph>>,
    index: OnceCell<Arc<dyn VectorIndex>>,
    embedder: OnceCell<Arc<EmbeddingClient>>,
    backend: OnceCell<GraphBackend>,
}

impl AppState {
    pub fn new(config: BioGraphConfig) -> Self {
        Self {
            config,
            graph: OnceCell::new(),
            index: OnceCell::new(),
            embedder: OnceCell::new(),
            backend: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &BioGraphConfig {
        &self.config
    }

    /// The local graph, parsed once per process.
    pub async fn graph(&self) -> Result<Arc<LocalGraph>> {
        let graph = self
            .graph
            .get_or_try_init(|| async {
                Ok::<_, crate::core::error::BioGraphError>(Arc::new(LocalGraph::load(
                    &self.config.paths.sample_graph,
                )?))
            })
            .await?;
        Ok(Arc::clone(graph))
    }

    /// The configured vector index backend, resolved once.
    pub async fn vector_index(&self) -> Result<Arc<dyn VectorIndex>> {
        let index = self
            .index
            .get_or_try_init(|| async {
                Ok::<_, crate::core::error::BioGraphError>(vector::build_index(
                    &self.config.vector_store,
                    &self.config.paths,
                )?)
            })
            .await?;
        Ok(Arc::clone(index))
    }

    pub async fn embedder(&self) -> Arc<EmbeddingClient> {
        let embedder = self
            .embedder
            .get_or_init(|| async { Arc::new(EmbeddingClient::new(&self.config.embedding)) })
            .await;
        Arc::clone(embedder)
    }

    /// The graph backend serving expansion requests. The live backend's
    /// rate gate lives in here, so it is shared by all requests.
    pub async fn graph_backend(&self) -> Result<&GraphBackend> {
        self.backend
            .get_or_try_init(|| async {
                match self.config.retrieval.graph_backend.as_str() {
                    "live" => Ok(GraphBackend::Live {
                        builder: LiveGraphBuilder::with_keyword_linker(EntrezClient::new(
                            &self.config.entrez,
                        )),
                        max_nodes: self.config.retrieval.prune_max_nodes,
                    }),
                    _ => Ok(GraphBackend::Local(self.graph().await?)),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_missing_graph() -> AppState {
        let mut config = BioGraphConfig::default();
        config.paths.sample_graph = "/nonexistent/graph.json".to_string();
        AppState::new(config)
    }

    #[tokio::test]
    async fn test_graph_initialized_once() {
        let state = state_with_missing_graph();
        let first = state.graph().await.unwrap();
        let second = state.graph().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_first_access_converges() {
        let state = Arc::new(state_with_missing_graph());
        let a = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.graph().await.unwrap() })
        };
        let b = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.graph().await.unwrap() })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_embedder_is_singleton() {
        let state = state_with_missing_graph();
        let first = state.embedder().await;
        let second = state.embedder().await;
        assert!(Arc::ptr_eq(&first, &second));
    }
}
