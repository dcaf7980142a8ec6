//! Disease entity linking over free text.
//!
//! The live backend infers gene-disease associations from literature
//! co-occurrence. How disease mentions are recognized is a pluggable
//! strategy: the default implementation is a small fixed keyword lexicon,
//! which is a heuristic placeholder rather than a general entity linker.

/// A disease mention found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseHit {
    /// Stable node id, e.g. `DISEASE_LUNG_CANCER`.
    pub id: String,
    /// Display label, e.g. `Lung Cancer`.
    pub name: String,
}

pub trait DiseaseLinker: Send + Sync {
    /// All disease mentions in `text`. Order follows the linker's own
    /// vocabulary order; callers deduplicate.
    fn link(&self, text: &str) -> Vec<DiseaseHit>;
}

/// Case-insensitive substring lexicon. Overlapping entries each produce a
/// hit ("lung cancer" text also links plain "cancer"); downstream edge
/// dedup tolerates that.
pub struct KeywordDiseaseLinker {
    lexicon: Vec<(&'static str, &'static str)>,
}

impl Default for KeywordDiseaseLinker {
    fn default() -> Self {
        Self {
            lexicon: vec![
                ("cancer", "DISEASE_CANCER"),
                ("lung cancer", "DISEASE_LUNG_CANCER"),
                ("breast cancer", "DISEASE_BREAST_CANCER"),
                ("colon cancer", "DISEASE_COLON_CANCER"),
                ("diabetes", "DISEASE_DIABETES"),
                ("alzheimer", "DISEASE_ALZHEIMERS"),
                ("parkinson", "DISEASE_PARKINSONS"),
            ],
        }
    }
}

impl DiseaseLinker for KeywordDiseaseLinker {
    fn link(&self, text: &str) -> Vec<DiseaseHit> {
        let lowered = text.to_lowercase();
        self.lexicon
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, id)| DiseaseHit {
                id: (*id).to_string(),
                name: display_name(id),
            })
            .collect()
    }
}

/// `DISEASE_LUNG_CANCER` -> `Lung Cancer`.
pub(crate) fn display_name(disease_id: &str) -> String {
    disease_id
        .trim_start_matches("DISEASE_")
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_keyword() {
        let linker = KeywordDiseaseLinker::default();
        let hits = linker.link("PTEN loss drives diabetes progression");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "DISEASE_DIABETES");
        assert_eq!(hits[0].name, "Diabetes");
    }

    #[test]
    fn test_overlapping_keywords_both_hit() {
        let linker = KeywordDiseaseLinker::default();
        let hits = linker.link("EGFR mutations in Lung Cancer patients");
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["DISEASE_CANCER", "DISEASE_LUNG_CANCER"]);
    }

    #[test]
    fn test_case_insensitive() {
        let linker = KeywordDiseaseLinker::default();
        assert!(!linker.link("ALZHEIMER disease cohort").is_empty());
    }

    #[test]
    fn test_no_hits() {
        let linker = KeywordDiseaseLinker::default();
        assert!(linker.link("ribosome assembly in yeast").is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("DISEASE_LUNG_CANCER"), "Lung Cancer");
        assert_eq!(display_name("DISEASE_ALZHEIMERS"), "Alzheimers");
    }
}
