//! End-to-end question answering pipeline.
//!
//! question -> embed -> vector seeds -> graph expansion -> context ->
//! LLM answer, bundled with the retrieved subgraph and an evidence list for
//! the presentation layer. A single upstream source failing never aborts
//! the request; partial data is formatted and returned.

use serde::Serialize;
use tracing::info;

use crate::context::format_context;
use crate::core::error::{BioGraphError, Result};
use crate::core::state::AppState;
use crate::llm::LlmProvider;
use crate::model::{Edge, Node, NodeType, Subgraph};
use crate::utils::safe_truncate_ellipsis;
use crate::vector::VectorRecord;

const SYSTEM_PROMPT: &str = "You are a biomedical assistant. Answer the question based ONLY on \
the provided context.\nInclude relevant PMIDs and experiment IDs as citations.";

/// A citation surfaced to the user alongside the answer.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub pmid: String,
    pub title: String,
    pub url: String,
}

/// Everything the presentation layer needs: the answer text, the retrieved
/// subgraph for visualization, and the supporting citations.
#[derive(Debug, Serialize)]
pub struct AnswerBundle {
    pub answer: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub evidence: Vec<Evidence>,
}

pub async fn answer_question(
    state: &AppState,
    provider: &dyn LlmProvider,
    question: &str,
) -> Result<AnswerBundle> {
    if question.trim().is_empty() {
        return Err(BioGraphError::Validation(
            "Question must not be empty".to_string(),
        ));
    }

    info!("Answering: {}", safe_truncate_ellipsis(question, 80));
    let retrieval = &state.config().retrieval;

    // The live backend works from the raw question; the local backend needs
    // vector-similar seed nodes first.
    let seeds: Vec<String> = if retrieval.graph_backend == "live" {
        vec![question.to_string()]
    } else {
        let query_vector = state.embedder().await.embed(question).await?;
        state
            .vector_index()
            .await?
            .query(&query_vector, retrieval.top_k, &retrieval.namespaces)
            .await?
            .into_iter()
            .map(|scored| scored.id)
            .collect()
    };

    let subgraph = state
        .graph_backend()
        .await?
        .expand(&seeds, retrieval.hops, retrieval.max_degree)
        .await;

    // A zero-node subgraph is a valid outcome; the prompt instructs the
    // model to say so rather than fabricate.
    let context = format_context(&subgraph);
    let answer = provider
        .generate(SYSTEM_PROMPT, &user_prompt(&context, question))
        .await?;

    let evidence = collect_evidence(&subgraph);
    let (nodes, edges) = subgraph.into_parts();
    info!(
        "Answered with {} nodes, {} edges, {} citations",
        nodes.len(),
        edges.len(),
        evidence.len()
    );
    Ok(AnswerBundle {
        answer,
        nodes,
        edges,
        evidence,
    })
}

pub(crate) fn user_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer (be concise and cite PMIDs):")
}

/// Citations in subgraph insertion order, deduplicated by PMID: publication
/// nodes first, then PMIDs referenced only from edge annotations.
pub(crate) fn collect_evidence(subgraph: &Subgraph) -> Vec<Evidence> {
    let mut seen = std::collections::HashSet::new();
    let mut evidence = Vec::new();

    for node in subgraph.nodes() {
        if node.node_type != NodeType::Publication {
            continue;
        }
        let Some(pmid) = node.properties.get("pmid").and_then(|v| v.as_str()) else {
            continue;
        };
        if !seen.insert(pmid.to_string()) {
            continue;
        }
        let url = node
            .properties
            .get("url")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| pubmed_url(pmid));
        evidence.push(Evidence {
            pmid: pmid.to_string(),
            title: node.name.clone(),
            url,
        });
    }

    for edge in subgraph.edges() {
        for pmid in edge.pmids() {
            if !seen.insert(pmid.clone()) {
                continue;
            }
            let title = edge
                .properties
                .get("evidence")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let url = pubmed_url(&pmid);
            evidence.push(Evidence { pmid, title, url });
        }
    }

    evidence
}

fn pubmed_url(pmid: &str) -> String {
    format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
}

/// Text embedded for one node: display label plus description, the same
/// shape the index build and question-time lookups share.
pub fn node_embedding_text(node: &Node) -> String {
    format!("{}: {}", node.name, node.description)
}

/// Offline/administrative path: embed every node of the local graph and
/// upsert the records into the configured vector index. Returns how many
/// records were indexed.
pub async fn build_node_index(state: &AppState) -> Result<usize> {
    let graph = state.graph().await?;
    if graph.is_empty() {
        info!("No nodes to index");
        return Ok(0);
    }

    let embedder = state.embedder().await;
    let index = state.vector_index().await?;

    let texts: Vec<String> = graph.nodes().iter().map(node_embedding_text).collect();
    let vectors = embedder.embed_batch(&texts).await?;

    let records: Vec<VectorRecord> = graph
        .nodes()
        .iter()
        .zip(vectors)
        .map(|(node, vector)| VectorRecord {
            id: node.id.clone(),
            vector,
            node_type: node.node_type.clone(),
            namespace: Some(node.node_type.to_string().to_lowercase()),
        })
        .collect();

    let count = records.len();
    index.upsert(records).await?;
    info!("Indexed {} nodes", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::core::config::BioGraphConfig;
    use crate::llm::LlmProviderError;

    struct CannedProvider;

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(
            &self,
            _: &str,
            _: &str,
        ) -> std::result::Result<String, LlmProviderError> {
            Ok("canned answer".to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_io() {
        let state = AppState::new(BioGraphConfig::default());
        let result = answer_question(&state, &CannedProvider, "  \n ").await;
        assert!(matches!(result, Err(BioGraphError::Validation(_))));
    }

    #[test]
    fn test_user_prompt_shape() {
        let prompt = user_prompt("CTX", "what does EGFR do?");
        assert!(prompt.starts_with("Context:\nCTX"));
        assert!(prompt.contains("Question: what does EGFR do?"));
    }

    #[test]
    fn test_collect_evidence_order_and_dedup() {
        let mut sg = Subgraph::new();
        sg.insert_node(
            Node::new("PMID_11", NodeType::Publication, "First paper")
                .with_property("pmid", serde_json::json!("11"))
                .with_property("url", serde_json::json!("https://pubmed.ncbi.nlm.nih.gov/11/")),
        );
        sg.insert_node(Node::new("GENE_EGFR", NodeType::Gene, "EGFR"));
        sg.insert_edge(
            Edge::new("GENE_EGFR", "DISEASE_CANCER", "ASSOCIATED_WITH")
                .with_property("pmids", serde_json::json!(["11", "22"]))
                .with_property("evidence", serde_json::json!("Second paper")),
        );

        let evidence = collect_evidence(&sg);
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].pmid, "11");
        assert_eq!(evidence[0].title, "First paper");
        assert_eq!(evidence[1].pmid, "22");
        assert_eq!(evidence[1].title, "Second paper");
        assert_eq!(evidence[1].url, "https://pubmed.ncbi.nlm.nih.gov/22/");
    }

    #[test]
    fn test_node_embedding_text() {
        let node = Node::new("GENE_EGFR", NodeType::Gene, "EGFR")
            .with_description("Receptor tyrosine kinase");
        assert_eq!(node_embedding_text(&node), "EGFR: Receptor tyrosine kinase");
    }
}
