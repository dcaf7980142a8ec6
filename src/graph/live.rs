//! On-demand graph assembled per-request from public biomedical APIs.
//!
//! Single-shot construction: extract gene mentions from the question, fetch
//! genes and publications, infer disease associations by literature
//! co-occurrence, link publications to the genes they mention. No further
//! hops from inferred disease nodes. Every node and edge produced here is
//! request-scoped and discarded after the response is formatted.

use regex::Regex;
use tracing::info;

use super::linker::{DiseaseLinker, KeywordDiseaseLinker};
use crate::fetch::EntrezClient;
use crate::model::{Edge, Node, NodeType, Subgraph};
use crate::utils::safe_truncate_ellipsis;

/// First-pass mention vocabulary; a question with no hit falls back to a
/// generic gene search.
pub const GENE_VOCABULARY: &[&str] = &[
    "EGFR", "TP53", "KRAS", "BRCA1", "BRCA2", "AKT1", "PIK3CA", "PTEN",
];

/// How many mentioned genes get detail fetches and association searches.
const MAX_GENES_EXPANDED: usize = 3;
const MAX_ASSOCIATIONS_PER_GENE: usize = 5;
const ASSOCIATION_PUBLICATIONS: usize = 10;

pub struct LiveGraphBuilder {
    entrez: EntrezClient,
    linker: Box<dyn DiseaseLinker>,
}

impl LiveGraphBuilder {
    pub fn new(entrez: EntrezClient, linker: Box<dyn DiseaseLinker>) -> Self {
        Self { entrez, linker }
    }

    pub fn with_keyword_linker(entrez: EntrezClient) -> Self {
        Self::new(entrez, Box::new(KeywordDiseaseLinker::default()))
    }

    /// Build the per-request graph. Upstream failures have already been
    /// converted to empty results by the fetch layer, so partial data flows
    /// through; the result is never an error.
    pub async fn build(&self, question: &str, max_nodes: usize) -> Subgraph {
        info!(
            "Building live graph for question: {}",
            safe_truncate_ellipsis(question, 80)
        );
        let mut subgraph = Subgraph::new();

        // Gene seeds: vocabulary mentions first, generic search as fallback.
        let mut symbols = extract_gene_mentions(question, GENE_VOCABULARY);
        if symbols.is_empty() {
            let genes = self.entrez.search_genes(question, 5).await;
            symbols = genes.iter().filter_map(gene_symbol).collect();
            for gene in genes {
                subgraph.insert_node(gene);
            }
        } else {
            for symbol in symbols.iter().take(MAX_GENES_EXPANDED) {
                for gene in self.entrez.search_genes(symbol, 1).await {
                    subgraph.insert_node(gene);
                }
            }
        }

        let budget = max_nodes.saturating_sub(subgraph.node_count()).min(10);
        let publications = if budget > 0 {
            self.entrez.search_publications(question, budget).await
        } else {
            Vec::new()
        };
        for publication in &publications {
            subgraph.insert_node(publication.clone());
        }

        // Disease associations by literature co-occurrence.
        for symbol in symbols.iter().take(MAX_GENES_EXPANDED) {
            let evidence = self
                .entrez
                .search_publications(
                    &format!("{symbol} AND disease[MeSH]"),
                    ASSOCIATION_PUBLICATIONS,
                )
                .await;
            let associations: Vec<(Edge, Node)> = evidence
                .iter()
                .flat_map(|publication| {
                    associations_from_publication(symbol, publication, self.linker.as_ref())
                })
                .take(MAX_ASSOCIATIONS_PER_GENE)
                .collect();
            for (edge, disease) in associations {
                if !subgraph.contains_node(&disease.id) {
                    subgraph.insert_node(disease);
                }
                subgraph.insert_edge(edge);
            }
        }

        // Publication -> gene MENTIONS edges.
        for publication in &publications {
            let text = format!("{} {}", publication.name, publication.description);
            for symbol in &symbols {
                if mentions_symbol(&text, symbol) {
                    let mut edge = Edge::new(
                        publication.id.clone(),
                        format!("GENE_{symbol}"),
                        "MENTIONS",
                    )
                    .with_description(format!("Publication mentions {symbol}"));
                    if let Some(pmid) = publication.properties.get("pmid") {
                        edge = edge.with_property("pmid", pmid.clone());
                    }
                    subgraph.insert_edge(edge);
                }
            }
        }

        info!(
            "Built live graph: {} nodes, {} edges",
            subgraph.node_count(),
            subgraph.edge_count()
        );
        subgraph
    }
}

/// Vocabulary symbols mentioned in the question, case-insensitive.
pub(crate) fn extract_gene_mentions(question: &str, vocabulary: &[&str]) -> Vec<String> {
    let lowered = question.to_lowercase();
    vocabulary
        .iter()
        .filter(|symbol| lowered.contains(&symbol.to_lowercase()))
        .map(|symbol| (*symbol).to_string())
        .collect()
}

/// Word-boundary, case-insensitive symbol match; bare containment would
/// link "KRAS" inside "KRAS4B" contexts incorrectly.
pub(crate) fn mentions_symbol(text: &str, symbol: &str) -> bool {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(symbol))) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// ASSOCIATED_WITH edges inferred from one publication's title + abstract,
/// each annotated with the supporting citation, paired with the disease
/// node it implies.
pub(crate) fn associations_from_publication(
    symbol: &str,
    publication: &Node,
    linker: &dyn DiseaseLinker,
) -> Vec<(Edge, Node)> {
    let text = format!("{} {}", publication.name, publication.description);
    let pmid = publication
        .properties
        .get("pmid")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    linker
        .link(&text)
        .into_iter()
        .map(|hit| {
            let edge = Edge::new(format!("GENE_{symbol}"), hit.id.clone(), "ASSOCIATED_WITH")
                .with_description(format!(
                    "{} associated with {}",
                    symbol,
                    hit.name.to_lowercase()
                ))
                .with_property("pmids", serde_json::json!([pmid]))
                .with_property("source", serde_json::json!("pubmed_literature"))
                .with_property("evidence", serde_json::json!(publication.name));
            let disease = Node::new(hit.id, NodeType::Disease, hit.name)
                .with_description("Disease entity from literature mining")
                .with_property("source", serde_json::json!("pubmed_inferred"));
            (edge, disease)
        })
        .collect()
}

fn gene_symbol(node: &Node) -> Option<String> {
    node.properties
        .get("symbol")
        .and_then(|v| v.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mentions_case_insensitive() {
        let mentions = extract_gene_mentions("does egfr drive lung cancer?", GENE_VOCABULARY);
        assert_eq!(mentions, vec!["EGFR"]);
    }

    #[test]
    fn test_extract_mentions_multiple_in_vocabulary_order() {
        let mentions =
            extract_gene_mentions("TP53 and EGFR crosstalk", GENE_VOCABULARY);
        assert_eq!(mentions, vec!["EGFR", "TP53"]);
    }

    #[test]
    fn test_extract_mentions_none() {
        assert!(extract_gene_mentions("what is CRISPR?", GENE_VOCABULARY).is_empty());
    }

    #[test]
    fn test_mentions_symbol_word_boundary() {
        assert!(mentions_symbol("EGFR mutations respond to gefitinib", "EGFR"));
        assert!(mentions_symbol("egfr-mutant tumors", "EGFR"));
        assert!(!mentions_symbol("KRAS4B isoform only", "KRAS"));
        assert!(!mentions_symbol("unrelated text", "EGFR"));
    }

    #[test]
    fn test_associations_from_publication() {
        let publication = Node::new("PMID_42", NodeType::Publication, "EGFR in lung cancer")
            .with_description("Cohort study of EGFR-mutant lung cancer.")
            .with_property("pmid", serde_json::json!("42"));
        let linker = KeywordDiseaseLinker::default();

        let associations = associations_from_publication("EGFR", &publication, &linker);
        // "lung cancer" text hits both the generic and the specific entry.
        assert_eq!(associations.len(), 2);

        let (edge, disease) = &associations[1];
        assert_eq!(edge.source, "GENE_EGFR");
        assert_eq!(edge.target, "DISEASE_LUNG_CANCER");
        assert_eq!(edge.relation, "ASSOCIATED_WITH");
        assert_eq!(edge.pmids(), vec!["42"]);
        assert_eq!(disease.node_type, NodeType::Disease);
        assert_eq!(disease.name, "Lung Cancer");
    }

    #[test]
    fn test_associations_without_disease_text() {
        let publication = Node::new("PMID_7", NodeType::Publication, "EGFR structure")
            .with_description("Crystal structure of the kinase domain.")
            .with_property("pmid", serde_json::json!("7"));
        let linker = KeywordDiseaseLinker::default();
        assert!(associations_from_publication("EGFR", &publication, &linker).is_empty());
    }
}
