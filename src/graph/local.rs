//! Statically loaded in-memory graph.
//!
//! Parses the sample-graph JSON once, builds forward and reverse adjacency,
//! and serves read-only lookups for the process lifetime. Node and edge
//! iteration preserves file order, which downstream formatting relies on.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::GraphError;
use crate::model::{Edge, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

#[derive(Deserialize, Default)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Default)]
pub struct LocalGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    successors: HashMap<String, Vec<String>>,
    predecessors: HashMap<String, Vec<String>>,
}

impl LocalGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the graph from a node/edge JSON file. A missing file is logged
    /// and yields an empty graph, matching the best-effort retrieval
    /// contract; a present-but-malformed file is a hard error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Sample graph file not found: {}", path.display());
            return Ok(Self::empty());
        }

        let data: GraphFile = serde_json::from_slice(&std::fs::read(path)?)?;
        let graph = Self::from_parts(data.nodes, data.edges);
        info!(
            "Loaded local graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Build from already-parsed nodes and edges, keeping their order.
    /// Duplicate node ids keep the first occurrence.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            if graph.node_index.contains_key(&node.id) {
                continue;
            }
            graph.node_index.insert(node.id.clone(), graph.nodes.len());
            graph.nodes.push(node);
        }
        for edge in edges {
            graph
                .successors
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
            graph
                .predecessors
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
            graph.edges.push(edge);
        }
        graph
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Immediate neighbors in the requested direction, in edge insertion
    /// order. Unknown ids yield an empty list.
    pub fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        match direction {
            Direction::Out => adjacent(&self.successors, id),
            Direction::In => adjacent(&self.predecessors, id),
            Direction::Both => {
                let mut all = adjacent(&self.successors, id);
                all.extend(adjacent(&self.predecessors, id));
                all
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn adjacent<'a>(map: &'a HashMap<String, Vec<String>>, id: &str) -> Vec<&'a str> {
    map.get(id)
        .map(|v| v.iter().map(String::as_str).collect())
        .unwrap_or_default()
}
