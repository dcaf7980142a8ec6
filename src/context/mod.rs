//! Deterministic textual context assembly.
//!
//! Serializes a subgraph into the entities/relationships block handed to
//! the language model. Iteration follows the subgraph's insertion order and
//! nothing is re-sorted, so identical inputs always produce byte-identical
//! text; caching and tests rely on that.

use std::fmt::Write;

use crate::model::Subgraph;

pub fn format_context(subgraph: &Subgraph) -> String {
    let mut out = String::new();

    out.push_str("### Relevant Biomedical Entities:\n\n");
    for node in subgraph.nodes() {
        let _ = writeln!(
            out,
            "- **{}** ({}): {}",
            node.name, node.node_type, node.description
        );
        let _ = writeln!(out, "  PMIDs: {}", citation_list(&node.pmids()));
    }

    out.push_str("\n### Relationships:\n\n");
    for edge in subgraph.edges() {
        let _ = writeln!(
            out,
            "- {} → **{}** → {}",
            edge.source, edge.relation, edge.target
        );
        if !edge.description.is_empty() {
            let _ = writeln!(out, "  {}", edge.description);
        }
        let _ = writeln!(out, "  PMIDs: {}", citation_list(&edge.pmids()));
    }

    out
}

fn citation_list(pmids: &[String]) -> String {
    if pmids.is_empty() {
        "none".to_string()
    } else {
        pmids.join(", ")
    }
}
