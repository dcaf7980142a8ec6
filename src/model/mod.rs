//! Canonical node/edge shapes shared by every backend.
//!
//! Nodes and edges are immutable once produced for a request. The local
//! backend creates them once at load time and serves them read-only for the
//! process lifetime; the live backend creates them fresh per request.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Entity category. Open set: anything outside the known biomedical
/// categories round-trips through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Gene,
    Disease,
    Drug,
    Publication,
    Other(String),
}

impl Default for NodeType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gene => write!(f, "Gene"),
            Self::Disease => write!(f, "Disease"),
            Self::Drug => write!(f, "Drug"),
            Self::Publication => write!(f, "Publication"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gene" => Self::Gene,
            "disease" => Self::Disease,
            "drug" => Self::Drug,
            "publication" => Self::Publication,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.to_string()
    }
}

/// A graph entity. `id` is unique within one graph snapshot; typed fields
/// cover the closed part of the shape and `properties` carries everything
/// source-specific (citation lists, organism, chromosome, urls).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            description: String::new(),
            properties: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Citation identifiers attached to this node, if any.
    pub fn pmids(&self) -> Vec<String> {
        pmids_of(&self.properties)
    }
}

/// A directed, typed edge. Endpoints are node ids and are not required to
/// exist in the same batch; dangling edges are filtered when a subgraph is
/// materialized. Identity is the `(source, target, relation)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            description: String::new(),
            properties: HashMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn key(&self) -> (String, String, String) {
        (
            self.source.clone(),
            self.target.clone(),
            self.relation.clone(),
        )
    }

    pub fn pmids(&self) -> Vec<String> {
        pmids_of(&self.properties)
    }
}

fn pmids_of(properties: &HashMap<String, serde_json::Value>) -> Vec<String> {
    match properties.get("pmids") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(serde_json::Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// The unit produced by one expansion: nodes unique by id, edges unique by
/// triple, both in insertion order so downstream formatting is deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Subgraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    node_ids: HashSet<String>,
    #[serde(skip)]
    edge_keys: HashSet<(String, String, String)>,
}

impl Subgraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; on id collision the first-seen record wins and the
    /// duplicate is dropped. Returns whether the node was new.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.node_ids.contains(&node.id) {
            return false;
        }
        self.node_ids.insert(node.id.clone());
        self.nodes.push(node);
        true
    }

    /// Insert an edge, deduplicated by the `(source, target, relation)`
    /// triple. Returns whether the edge was new.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        let key = edge.key();
        if self.edge_keys.contains(&key) {
            return false;
        }
        self.edge_keys.insert(key);
        self.edges.push(edge);
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
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
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Merge `other` into `self` under the same first-seen-wins rules.
    pub fn merge(&mut self, other: Subgraph) {
        for node in other.nodes {
            self.insert_node(node);
        }
        for edge in other.edges {
            self.insert_edge(edge);
        }
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_round_trip() {
        assert_eq!(NodeType::from("gene"), NodeType::Gene);
        assert_eq!(NodeType::from("Publication"), NodeType::Publication);
        assert_eq!(
            NodeType::from("Pathway"),
            NodeType::Other("Pathway".to_string())
        );
        assert_eq!(NodeType::Gene.to_string(), "Gene");
    }

    #[test]
    fn test_node_pmids() {
        let node = Node::new("GENE_EGFR", NodeType::Gene, "EGFR")
            .with_property("pmids", serde_json::json!(["12345", "67890"]));
        assert_eq!(node.pmids(), vec!["12345", "67890"]);

        let bare = Node::new("GENE_TP53", NodeType::Gene, "TP53");
        assert!(bare.pmids().is_empty());
    }

    #[test]
    fn test_subgraph_first_seen_node_wins() {
        let mut sg = Subgraph::new();
        assert!(sg.insert_node(
            Node::new("GENE_EGFR", NodeType::Gene, "EGFR").with_description("first")
        ));
        assert!(!sg.insert_node(
            Node::new("GENE_EGFR", NodeType::Gene, "EGFR").with_description("second")
        ));
        assert_eq!(sg.node_count(), 1);
        assert_eq!(sg.nodes()[0].description, "first");
    }

    #[test]
    fn test_subgraph_edge_triple_dedup() {
        let mut sg = Subgraph::new();
        assert!(sg.insert_edge(Edge::new("a", "b", "ASSOCIATED_WITH")));
        assert!(!sg.insert_edge(Edge::new("a", "b", "ASSOCIATED_WITH")));
        // Same endpoints, different relation: distinct edge.
        assert!(sg.insert_edge(Edge::new("a", "b", "MENTIONS")));
        assert_eq!(sg.edge_count(), 2);
    }

    #[test]
    fn test_merge_preserves_insertion_order() {
        let mut a = Subgraph::new();
        a.insert_node(Node::new("n1", NodeType::Gene, "one"));
        let mut b = Subgraph::new();
        b.insert_node(Node::new("n1", NodeType::Disease, "dup"));
        b.insert_node(Node::new("n2", NodeType::Disease, "two"));
        a.merge(b);
        assert_eq!(a.node_count(), 2);
        assert_eq!(a.nodes()[0].name, "one");
        assert_eq!(a.nodes()[1].name, "two");
    }

    #[test]
    fn test_node_serde_type_field() {
        let node = Node::new("GENE_KRAS", NodeType::Gene, "KRAS");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Gene");
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back.node_type, NodeType::Gene);
    }
}
