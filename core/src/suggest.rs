//! Suggestion Index
//!
//! Autocomplete candidates for partial issue descriptions.

/// Queries shorter than this (in characters) produce no suggestions
pub const MIN_QUERY_LEN: usize = 3;

/// Default candidate vocabulary
pub const DEFAULT_VOCABULARY: [&str; 5] = [
    "motor overheating",
    "bearing failure",
    "pump leakage",
    "conveyor belt tear",
    "sensor malfunction",
];

/// Anything that can turn partial input into candidates
///
/// Implementations must keep the contract: nothing below [`MIN_QUERY_LEN`],
/// case-insensitive substring matching, results in the source's own order.
pub trait SuggestionSource: Send + Sync {
    fn suggest(&self, query: &str) -> Vec<String>;
}

/// Matcher over a fixed list of terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVocabulary {
    terms: Vec<String>,
    lowered: Vec<String>,
}

impl StaticVocabulary {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let lowered = terms.iter().map(|t| t.to_lowercase()).collect();
        Self { terms, lowered }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for StaticVocabulary {
    fn default() -> Self {
        Self::from_terms(DEFAULT_VOCABULARY)
    }
}

impl SuggestionSource for StaticVocabulary {
    fn suggest(&self, query: &str) -> Vec<String> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.terms
            .iter()
            .zip(&self.lowered)
            .filter(|(_, lowered)| lowered.contains(&needle))
            .map(|(term, _)| term.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_query_is_suppressed() {
        let vocab = StaticVocabulary::default();
        assert!(vocab.suggest("").is_empty());
        assert!(vocab.suggest("mo").is_empty());
        assert_eq!(vocab.suggest("mot"), vec!["motor overheating"]);
    }

    #[test]
    fn test_case_insensitive_and_ordered() {
        let vocab = StaticVocabulary::default();
        assert_eq!(
            vocab.suggest("ING"),
            vec!["motor overheating", "bearing failure"]
        );
        assert_eq!(vocab.suggest("Leak"), vec!["pump leakage"]);
        assert!(vocab.suggest("valve").is_empty());
    }

    #[test]
    fn test_threshold_counts_characters() {
        let vocab = StaticVocabulary::from_terms(["Überhitzung Motor", "Lager"]);
        assert!(vocab.suggest("Üb").is_empty());
        assert_eq!(vocab.suggest("übe"), vec!["Überhitzung Motor"]);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let source: Box<dyn SuggestionSource> = Box::new(StaticVocabulary::from_terms(["Seal failure"]));
        assert_eq!(source.suggest("seal"), vec!["Seal failure"]);
    }
}
