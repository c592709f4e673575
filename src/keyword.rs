//! Lexical overlap scoring.
//!
//! A document's score for a query is the fraction of the query's distinct
//! terms that also occur in the document. The measure is asymmetric: a
//! long document containing every query term scores 1.0 regardless of
//! what else it contains.

use std::collections::HashSet;

use crate::ranking::{self, ScoredLine};

/// Terms dropped during tokenization unless a different set is supplied.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with",
    "is", "are", "was", "were", "be", "been", "being", "that", "this", "it",
    "as", "after", "before", "by", "from", "at", "we", "you", "your", "our",
    "they", "them", "their", "into", "until", "then",
];

/// Scores documents by how much of a query's vocabulary they cover.
///
/// The stopword set is fixed at construction.
///
/// # Examples
///
/// ```
/// use linesift::keyword::KeywordScorer;
///
/// let scorer = KeywordScorer::default();
/// let docs = vec!["cat sat on mat".to_string(), "dog ran in park".to_string()];
/// let hits = scorer.search("cat mat", &docs, 3);
///
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].index, 0);
/// assert_eq!(hits[0].score, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    stopwords: HashSet<String>,
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().copied())
    }
}

impl KeywordScorer {
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|w| w.into().to_lowercase())
                .collect(),
        }
    }

    /// Extract the distinct terms of `text`.
    ///
    /// Terms are maximal runs of ASCII letters, digits and apostrophes in
    /// the lower-cased text. Stopwords and single-character terms are
    /// dropped.
    pub fn tokenize(&self, text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '\''))
            .filter(|term| term.len() > 1 && !self.stopwords.contains(*term))
            .map(str::to_string)
            .collect()
    }

    /// `|Q ∩ D| / |Q|`, or 0.0 when the query has no terms.
    pub fn score(&self, query: &str, doc: &str) -> f32 {
        let query_terms = self.tokenize(query);
        self.score_terms(&query_terms, doc)
    }

    fn score_terms(&self, query_terms: &HashSet<String>, doc: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let doc_terms = self.tokenize(doc);
        let overlap = query_terms.intersection(&doc_terms).count();
        overlap as f32 / query_terms.len() as f32
    }

    /// Rank `docs` against `query`, keeping only positive scores.
    pub fn search(
        &self,
        query: &str,
        docs: &[String],
        top_k: usize,
    ) -> Vec<ScoredLine> {
        let query_terms = self.tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let scored = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                ScoredLine::new(self.score_terms(&query_terms, doc), i)
            })
            .filter(|s| s.score > 0.0)
            .collect();

        ranking::top_k(scored, top_k)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn docs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn terms(words: &[&str]) -> HashSet<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokenize_lowercases_and_filters() {
        let scorer = KeywordScorer::default();
        assert_eq!(
            scorer.tokenize("The Cat sat on THE mat, a cat!"),
            terms(&["cat", "sat", "mat"])
        );
    }

    #[test]
    fn tokenize_keeps_apostrophes_and_digits() {
        let scorer = KeywordScorer::default();
        assert_eq!(
            scorer.tokenize("Don't restore v2 backups-2024"),
            terms(&["don't", "restore", "v2", "backups", "2024"])
        );
    }

    #[test]
    fn tokenize_drops_single_characters() {
        let scorer = KeywordScorer::default();
        assert!(scorer.tokenize("x y z 1 2").is_empty());
    }

    #[test]
    fn custom_stopwords_replace_defaults() {
        let scorer = KeywordScorer::new(["cat"]);
        assert_eq!(
            scorer.tokenize("the cat sat"),
            terms(&["the", "sat"])
        );
    }

    #[test]
    fn score_is_query_coverage() {
        let scorer = KeywordScorer::default();
        assert_eq!(scorer.score("cat mat", "cat sat on mat"), 1.0);
        assert_eq!(scorer.score("cat dog", "cat sat on mat"), 0.5);
        assert_eq!(scorer.score("cat mat", "dog ran in park"), 0.0);
    }

    #[test]
    fn score_is_asymmetric() {
        let scorer = KeywordScorer::default();
        assert_eq!(scorer.score("cat", "cat sat on mat"), 1.0);
        assert!((scorer.score("cat sat mat", "cat") - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn score_with_only_stopwords_is_zero() {
        let scorer = KeywordScorer::default();
        assert_eq!(scorer.score("the and of", "the and of"), 0.0);
    }

    #[test]
    fn search_cat_mat_scenario() {
        let scorer = KeywordScorer::default();
        let corpus = docs(&["cat sat on mat", "dog ran in park"]);

        let hits = scorer.search("cat mat", &corpus, 3);
        assert_eq!(hits, vec![ScoredLine::new(1.0, 0)]);
    }

    #[test]
    fn search_respects_top_k() {
        let scorer = KeywordScorer::default();
        let corpus = docs(&[
            "malware recovery plan",
            "malware",
            "recovery from malware and ransomware",
        ]);

        let hits = scorer.search("malware recovery", &corpus, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[0].index, 0);
    }

    #[test]
    fn search_ties_break_by_index() {
        let scorer = KeywordScorer::default();
        let corpus = docs(&["backup", "restore", "backup tapes", "backup"]);

        let hits = scorer.search("backup", &corpus, 10);
        let indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn search_empty_query_or_corpus() {
        let scorer = KeywordScorer::default();
        let corpus = docs(&["cat sat on mat"]);

        assert!(scorer.search("", &corpus, 3).is_empty());
        assert!(scorer.search("the of", &corpus, 3).is_empty());
        assert!(scorer.search("cat", &[], 3).is_empty());
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_range(query in "[a-z' ]{0,40}", doc in "[a-z' ]{0,80}") {
            let scorer = KeywordScorer::default();
            let score = scorer.score(&query, &doc);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn full_score_iff_all_terms_present(query in "[a-z ]{0,40}", doc in "[a-z ]{0,80}") {
            let scorer = KeywordScorer::default();
            let q = scorer.tokenize(&query);
            let d = scorer.tokenize(&doc);
            let covered = !q.is_empty() && q.is_subset(&d);
            prop_assert_eq!(scorer.score(&query, &doc) == 1.0, covered);
        }

        #[test]
        fn termless_queries_find_nothing(query in "[ .,!?]{0,20}", doc in "[a-z ]{0,80}") {
            let scorer = KeywordScorer::default();
            prop_assert!(scorer.search(&query, &[doc], 5).is_empty());
        }
    }
}
