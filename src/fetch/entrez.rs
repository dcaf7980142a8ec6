//! NCBI E-utilities client: gene search/summary (JSON) and PubMed article
//! fetch (XML), parsed into canonical [`Node`]s.
//!
//! Every public method degrades to an empty result on failure. The
//! orchestrator treats "no data from this source" as a normal outcome, so
//! nothing here propagates transport or parse errors upward.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::core::config::EntrezConfig;
use crate::fetch::client::{FetchError, RateLimitedClient};
use crate::model::{Node, NodeType};
use crate::utils::safe_truncate_ellipsis;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Sent when no contact address is configured; NCBI asks for one per call.
const DEFAULT_CONTACT_EMAIL: &str = "biograph@example.com";

pub struct EntrezClient {
    client: RateLimitedClient,
    email: String,
    api_key: Option<String>,
}

impl EntrezClient {
    pub fn new(cfg: &EntrezConfig) -> Self {
        let email = if cfg.email.is_empty() {
            DEFAULT_CONTACT_EMAIL.to_string()
        } else {
            cfg.email.clone()
        };
        Self {
            client: RateLimitedClient::new(
                Duration::from_millis(cfg.min_interval_ms),
                Duration::from_secs(cfg.timeout_secs),
            ),
            email,
            api_key: cfg.api_key.clone(),
        }
    }

    fn base_params(&self, db: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", db.to_string()), ("email", self.email.clone())];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Search human genes by name or symbol. Empty on any failure.
    pub async fn search_genes(&self, query: &str, max_results: usize) -> Vec<Node> {
        match self.try_search_genes(query, max_results).await {
            Ok(genes) => genes,
            Err(e) => {
                warn!("Gene search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_search_genes(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Node>, FetchError> {
        let mut params = self.base_params("gene");
        params.push((
            "term",
            format!("{query}[Gene Name] AND Homo sapiens[Organism]"),
        ));
        params.push(("retmax", max_results.to_string()));
        params.push(("retmode", "json".to_string()));

        let data = self.client.get_json(ESEARCH_URL, &params).await?;
        let ids = id_list(&data);
        if ids.is_empty() {
            debug!("No gene ids for '{}'", query);
            return Ok(Vec::new());
        }
        self.try_fetch_gene_details(&ids).await
    }

    /// Fetch gene summaries by NCBI Gene id. Empty on any failure.
    pub async fn fetch_gene_details(&self, gene_ids: &[String]) -> Vec<Node> {
        match self.try_fetch_gene_details(gene_ids).await {
            Ok(genes) => genes,
            Err(e) => {
                warn!("Gene fetch failed for {:?}: {}", gene_ids, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_gene_details(&self, gene_ids: &[String]) -> Result<Vec<Node>, FetchError> {
        let mut params = self.base_params("gene");
        params.push(("id", gene_ids.join(",")));
        params.push(("retmode", "json".to_string()));

        let data = self.client.get_json(ESUMMARY_URL, &params).await?;
        Ok(genes_from_summary(&data))
    }

    /// Search PubMed by relevance. Empty on any failure.
    pub async fn search_publications(&self, query: &str, max_results: usize) -> Vec<Node> {
        match self.try_search_publications(query, max_results).await {
            Ok(pubs) => pubs,
            Err(e) => {
                warn!(
                    "Publication search failed for '{}': {}",
                    safe_truncate_ellipsis(query, 80),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn try_search_publications(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Node>, FetchError> {
        let mut params = self.base_params("pubmed");
        params.push(("term", query.to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("retmode", "json".to_string()));
        params.push(("sort", "relevance".to_string()));

        let data = self.client.get_json(ESEARCH_URL, &params).await?;
        let pmids = id_list(&data);
        if pmids.is_empty() {
            debug!("No PMIDs for '{}'", safe_truncate_ellipsis(query, 80));
            return Ok(Vec::new());
        }
        self.try_fetch_publication_details(&pmids).await
    }

    /// Fetch full article records by PMID. Empty on any failure.
    pub async fn fetch_publication_details(&self, pmids: &[String]) -> Vec<Node> {
        match self.try_fetch_publication_details(pmids).await {
            Ok(pubs) => pubs,
            Err(e) => {
                warn!("Publication fetch failed for {:?}: {}", pmids, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_publication_details(
        &self,
        pmids: &[String],
    ) -> Result<Vec<Node>, FetchError> {
        let mut params = self.base_params("pubmed");
        params.push(("id", pmids.join(",")));
        params.push(("retmode", "xml".to_string()));

        let xml = self.client.get_text(EFETCH_URL, &params).await?;
        let articles = parse_pubmed_articles(&xml)?;
        Ok(articles.into_iter().map(PubmedArticle::into_node).collect())
    }
}

/// Pull the esearch id list out of a JSON response. Absent fields are an
/// empty list, never an error.
fn id_list(data: &serde_json::Value) -> Vec<String> {
    data.pointer("/esearchresult/idlist")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Convert an esummary gene payload into gene nodes. The `result` object
/// maps gene ids to records plus a bookkeeping `uids` key that is skipped.
fn genes_from_summary(data: &serde_json::Value) -> Vec<Node> {
    let Some(result) = data.get("result").and_then(|v| v.as_object()) else {
        return Vec::new();
    };

    let mut genes = Vec::new();
    for (gene_id, record) in result {
        if gene_id == "uids" {
            continue;
        }
        let symbol = record
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(gene_id)
            .to_string();
        let full_name = record
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let summary = record
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let organism = record
            .pointer("/organism/scientificname")
            .and_then(|v| v.as_str())
            .unwrap_or("Homo sapiens")
            .to_string();
        let chromosome = record
            .get("chromosome")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        genes.push(
            Node::new(format!("GENE_{symbol}"), NodeType::Gene, full_name)
                .with_description(summary)
                .with_property("symbol", serde_json::json!(symbol))
                .with_property("organism", serde_json::json!(organism))
                .with_property("chromosome", serde_json::json!(chromosome))
                .with_property("gene_id", serde_json::json!(gene_id))
                .with_property("source", serde_json::json!("ncbi_gene")),
        );
    }
    genes
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct PubmedArticle {
    pub pmid: String,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
}

impl PubmedArticle {
    fn into_node(self) -> Node {
        let url = format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.pmid);
        Node::new(
            format!("PMID_{}", self.pmid),
            NodeType::Publication,
            self.title,
        )
        .with_description(self.abstract_text)
        .with_property("pmid", serde_json::json!(self.pmid))
        .with_property("authors", serde_json::json!(self.authors))
        .with_property("source", serde_json::json!("pubmed"))
        .with_property("url", serde_json::json!(url))
    }
}

/// Parse an efetch `PubmedArticleSet` document. Missing fields degrade to
/// empty strings/lists; only a malformed document is an error.
pub(crate) fn parse_pubmed_articles(xml: &str) -> Result<Vec<PubmedArticle>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut article: Option<PubmedArticle> = None;
    let mut in_author = false;
    let mut fore_name = String::new();
    let mut last_name = String::new();
    // Name of the element whose text we are currently inside.
    let mut current = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "PubmedArticle" {
                    article = Some(PubmedArticle::default());
                } else if name == "Author" {
                    in_author = true;
                    fore_name.clear();
                    last_name.clear();
                }
                current.push(name);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "PubmedArticle" {
                    if let Some(done) = article.take() {
                        articles.push(done);
                    }
                } else if name == "Author" {
                    in_author = false;
                    if !last_name.is_empty() {
                        let full = if fore_name.is_empty() {
                            last_name.clone()
                        } else {
                            format!("{fore_name} {last_name}")
                        };
                        if let Some(a) = article.as_mut() {
                            a.authors.push(full);
                        }
                    }
                }
                current.pop();
            }
            Event::Text(e) => {
                let text = e.unescape()?.to_string();
                let Some(a) = article.as_mut() else { continue };
                match current.last().map(String::as_str) {
                    // Only the citation PMID; later PMID elements
                    // (references, corrections) are ignored.
                    Some("PMID") if a.pmid.is_empty() => a.pmid = text,
                    Some("ArticleTitle") if a.title.is_empty() => a.title = text,
                    Some("AbstractText") if a.abstract_text.is_empty() => a.abstract_text = text,
                    Some("ForeName") if in_author => fore_name = text,
                    Some("LastName") if in_author => last_name = text,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_XML: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">12345678</PMID>
      <Article>
        <ArticleTitle>EGFR mutations in non-small cell lung cancer</ArticleTitle>
        <Abstract>
          <AbstractText>EGFR activating mutations predict response to TKIs.</AbstractText>
        </Abstract>
        <AuthorList>
          <Author><LastName>Lynch</LastName><ForeName>Thomas</ForeName></Author>
          <Author><LastName>Bell</LastName></Author>
        </AuthorList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">87654321</PMID>
      <Article>
        <ArticleTitle>TP53 and tumor suppression</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_parse_articles() {
        let articles = parse_pubmed_articles(ARTICLE_XML).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.pmid, "12345678");
        assert_eq!(first.title, "EGFR mutations in non-small cell lung cancer");
        assert_eq!(
            first.abstract_text,
            "EGFR activating mutations predict response to TKIs."
        );
        assert_eq!(first.authors, vec!["Thomas Lynch", "Bell"]);
    }

    #[test]
    fn test_parse_article_missing_abstract() {
        let articles = parse_pubmed_articles(ARTICLE_XML).unwrap();
        let second = &articles[1];
        assert_eq!(second.pmid, "87654321");
        assert_eq!(second.abstract_text, "");
        assert!(second.authors.is_empty());
    }

    #[test]
    fn test_parse_empty_set() {
        let articles = parse_pubmed_articles("<PubmedArticleSet></PubmedArticleSet>").unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_article_into_node() {
        let node = PubmedArticle {
            pmid: "111".to_string(),
            title: "A title".to_string(),
            abstract_text: "An abstract".to_string(),
            authors: vec!["A B".to_string()],
        }
        .into_node();
        assert_eq!(node.id, "PMID_111");
        assert_eq!(node.node_type, NodeType::Publication);
        assert_eq!(
            node.properties["url"],
            serde_json::json!("https://pubmed.ncbi.nlm.nih.gov/111/")
        );
    }

    #[test]
    fn test_id_list_missing_field() {
        assert!(id_list(&serde_json::json!({})).is_empty());
        let data = serde_json::json!({"esearchresult": {"idlist": ["1", "2"]}});
        assert_eq!(id_list(&data), vec!["1", "2"]);
    }

    #[test]
    fn test_genes_from_summary() {
        let data = serde_json::json!({
            "result": {
                "uids": ["1956"],
                "1956": {
                    "name": "EGFR",
                    "description": "epidermal growth factor receptor",
                    "summary": "Receptor tyrosine kinase.",
                    "organism": {"scientificname": "Homo sapiens"},
                    "chromosome": "7"
                }
            }
        });
        let genes = genes_from_summary(&data);
        assert_eq!(genes.len(), 1);
        let gene = &genes[0];
        assert_eq!(gene.id, "GENE_EGFR");
        assert_eq!(gene.name, "epidermal growth factor receptor");
        assert_eq!(gene.properties["symbol"], serde_json::json!("EGFR"));
        assert_eq!(gene.properties["chromosome"], serde_json::json!("7"));
    }

    #[test]
    fn test_genes_from_summary_malformed() {
        assert!(genes_from_summary(&serde_json::json!({"error": "bad"})).is_empty());
    }
}
