//! Expansion orchestrator: bounded multi-hop neighborhood expansion around
//! seed nodes, with one entry point serving both graph backends.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::graph::{Direction, LiveGraphBuilder, LocalGraph};
use crate::model::Subgraph;

/// Expand `seed_ids` over the local graph.
///
/// Each hop follows up to `max_degree` successors and up to `max_degree`
/// predecessors per frontier node (truncation in the backend's edge
/// insertion order, not rank-ordered), then the induced subgraph over all
/// visited nodes is materialized: every visited node that exists in the
/// graph plus every edge whose both endpoints were visited.
///
/// `hops = 0` returns exactly the seeds and any edges directly between
/// them; empty seeds return an empty subgraph without touching the graph.
pub fn expand_local(
    graph: &LocalGraph,
    seed_ids: &[String],
    hops: usize,
    max_degree: usize,
) -> Subgraph {
    if seed_ids.is_empty() {
        return Subgraph::new();
    }

    let mut visited: HashSet<String> = seed_ids.iter().cloned().collect();
    let mut frontier = visited.clone();

    for _ in 0..hops {
        let mut next_frontier = HashSet::new();
        for node_id in &frontier {
            if !graph.contains(node_id) {
                continue;
            }
            for neighbor in graph
                .neighbors(node_id, Direction::Out)
                .into_iter()
                .take(max_degree)
            {
                next_frontier.insert(neighbor.to_string());
            }
            for neighbor in graph
                .neighbors(node_id, Direction::In)
                .into_iter()
                .take(max_degree)
            {
                next_frontier.insert(neighbor.to_string());
            }
        }
        visited.extend(next_frontier.iter().cloned());
        frontier = next_frontier;
    }

    let mut subgraph = Subgraph::new();
    for node in graph.nodes() {
        if visited.contains(&node.id) {
            subgraph.insert_node(node.clone());
        }
    }
    for edge in graph.edges() {
        // Both endpoints must be visited *and* have a node record; an edge
        // naming an undeclared node id would otherwise dangle in the result.
        if visited.contains(&edge.source)
            && visited.contains(&edge.target)
            && graph.contains(&edge.source)
            && graph.contains(&edge.target)
        {
            subgraph.insert_edge(edge.clone());
        }
    }

    info!(
        "Expanded {} seeds to {} nodes and {} edges",
        seed_ids.len(),
        subgraph.node_count(),
        subgraph.edge_count()
    );
    subgraph
}

/// Backend selected once at startup; both arms serve the same entry point
/// so upstream callers never branch on the mode.
pub enum GraphBackend {
    Local(Arc<LocalGraph>),
    Live {
        builder: LiveGraphBuilder,
        max_nodes: usize,
    },
}

impl GraphBackend {
    /// Expand seeds into a subgraph.
    ///
    /// The live arm ignores `hops` and `max_degree` (kept for interface
    /// parity) and treats `seed_ids[0]` as the raw question text.
    pub async fn expand(
        &self,
        seed_ids: &[String],
        hops: usize,
        max_degree: usize,
    ) -> Subgraph {
        match self {
            Self::Local(graph) => expand_local(graph, seed_ids, hops, max_degree),
            Self::Live { builder, max_nodes } => {
                let Some(question) = seed_ids.first() else {
                    return Subgraph::new();
                };
                builder.build(question, *max_nodes).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node, NodeType};

    fn chain_graph() -> LocalGraph {
        // a -> b -> c -> d, plus a publication pointing at a.
        LocalGraph::from_parts(
            vec![
                Node::new("a", NodeType::Gene, "a"),
                Node::new("b", NodeType::Disease, "b"),
                Node::new("c", NodeType::Drug, "c"),
                Node::new("d", NodeType::Disease, "d"),
                Node::new("p", NodeType::Publication, "p"),
            ],
            vec![
                Edge::new("a", "b", "ASSOCIATED_WITH"),
                Edge::new("b", "c", "TREATED_BY"),
                Edge::new("c", "d", "TREATS"),
                Edge::new("p", "a", "MENTIONS"),
            ],
        )
    }

    fn seeds(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_hops_returns_seeds_and_seed_edges() {
        let graph = chain_graph();
        let result = expand_local(&graph, &seeds(&["a", "b"]), 0, 10);
        let ids: Vec<&str> = result.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(result.edge_count(), 1);
        assert_eq!(result.edges()[0].relation, "ASSOCIATED_WITH");
    }

    #[test]
    fn test_one_hop_follows_both_directions() {
        let graph = chain_graph();
        let result = expand_local(&graph, &seeds(&["a"]), 1, 10);
        let ids: Vec<&str> = result.nodes().iter().map(|n| n.id.as_str()).collect();
        // Successor b and predecessor p, in graph file order.
        assert_eq!(ids, vec!["a", "b", "p"]);
        assert_eq!(result.edge_count(), 2);
    }

    #[test]
    fn test_node_set_monotone_in_hops() {
        let graph = chain_graph();
        for h in 0..4 {
            let smaller = expand_local(&graph, &seeds(&["a"]), h, 10);
            let larger = expand_local(&graph, &seeds(&["a"]), h + 1, 10);
            for node in smaller.nodes() {
                assert!(larger.contains_node(&node.id));
            }
        }
    }

    #[test]
    fn test_empty_seeds() {
        let graph = chain_graph();
        let result = expand_local(&graph, &[], 3, 10);
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let graph = LocalGraph::empty();
        let result = expand_local(&graph, &seeds(&["anything"]), 2, 10);
        // Seeds that do not exist in the graph are not materialized.
        assert_eq!(result.node_count(), 0);
        assert_eq!(result.edge_count(), 0);
    }

    #[test]
    fn test_max_degree_caps_fanout() {
        let hub_edges: Vec<Edge> = (0..5)
            .map(|i| Edge::new("hub", format!("n{i}"), "LINKS"))
            .collect();
        let mut nodes = vec![Node::new("hub", NodeType::Gene, "hub")];
        nodes.extend((0..5).map(|i| Node::new(format!("n{i}"), NodeType::Disease, "n")));
        let graph = LocalGraph::from_parts(nodes, hub_edges);

        let result = expand_local(&graph, &seeds(&["hub"]), 1, 2);
        // Hub plus the first two successors in edge insertion order.
        assert_eq!(result.node_count(), 3);
    }

    #[test]
    fn test_edge_to_undeclared_node_is_dropped() {
        // An edge may name a node id the graph never declares; such edges
        // must not dangle in the expansion result.
        let graph = LocalGraph::from_parts(
            vec![Node::new("a", NodeType::Gene, "a")],
            vec![Edge::new("a", "ghost", "ASSOCIATED_WITH")],
        );
        let result = expand_local(&graph, &seeds(&["a"]), 1, 10);
        assert_eq!(result.node_count(), 1);
        assert_eq!(result.edge_count(), 0);
    }

    #[test]
    fn test_gene_disease_scenario() {
        let graph = LocalGraph::from_parts(
            vec![
                Node::new("EGFR", NodeType::Gene, "EGFR"),
                Node::new("ColonCancer", NodeType::Disease, "Colon Cancer"),
            ],
            vec![Edge::new("EGFR", "ColonCancer", "ASSOCIATED_WITH")],
        );
        let result = expand_local(&graph, &seeds(&["EGFR"]), 1, 10);
        assert!(result.contains_node("EGFR"));
        assert!(result.contains_node("ColonCancer"));
        assert_eq!(result.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_backend_local_arm() {
        let backend = GraphBackend::Local(Arc::new(chain_graph()));
        let result = backend.expand(&seeds(&["a"]), 1, 10).await;
        assert_eq!(result.node_count(), 3);
    }

    #[tokio::test]
    async fn test_backend_live_arm_empty_seeds() {
        use crate::core::config::EntrezConfig;
        use crate::fetch::EntrezClient;
        use crate::graph::LiveGraphBuilder;

        let backend = GraphBackend::Live {
            builder: LiveGraphBuilder::with_keyword_linker(EntrezClient::new(
                &EntrezConfig::default(),
            )),
            max_nodes: 40,
        };
        // No seeds means no question; nothing is fetched.
        let result = backend.expand(&[], 2, 10).await;
        assert!(result.is_empty());
    }
}
