/// Top-K semantic matching of free text against the catalogue phrasings.
use std::collections::HashSet;
use std::sync::Arc;

use sahayak_common::embedding::cosine_similarity;

use crate::catalog::CatalogIndex;
use crate::error::AppError;
use crate::model::{MatchResult, SectionMatch};

/// What to do when several top phrasings belong to the same section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Return one row per phrasing; a section can appear more than once.
    #[default]
    Keep,
    /// Keep only each section's best-scoring phrasing and keep filling to K.
    Collapse,
}

impl DuplicatePolicy {
    pub fn from_flag(deduplicate: bool) -> Self {
        if deduplicate {
            Self::Collapse
        } else {
            Self::Keep
        }
    }
}

pub struct SectionMatcher {
    catalog: Arc<CatalogIndex>,
    policy: DuplicatePolicy,
}

impl SectionMatcher {
    pub fn new(catalog: Arc<CatalogIndex>, policy: DuplicatePolicy) -> Self {
        Self { catalog, policy }
    }

    /// Rank catalogue sections by similarity to `text`.
    ///
    /// Any string is accepted, including the empty one. Results are in descending score order
    /// and ties keep the catalogue's phrasing order.
    pub async fn classify(&self, text: &str, top_k: usize) -> Result<MatchResult, AppError> {
        let query = self.catalog.embeddings_of(text).await?;
        Ok(self.rank(&query, top_k))
    }

    fn rank(&self, query: &[f32], top_k: usize) -> MatchResult {
        let rows = self.catalog.index().rows();
        let mut scored: Vec<(usize, f32)> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, cosine_similarity(query, &row.vector)))
            .collect();
        // Stable: equal scores stay in catalogue order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let entries = self.catalog.all_entries();
        let mut seen = HashSet::new();
        let matches = scored
            .into_iter()
            .filter(|(i, _)| match self.policy {
                DuplicatePolicy::Keep => true,
                DuplicatePolicy::Collapse => seen.insert(rows[*i].entry_idx),
            })
            .take(top_k)
            .map(|(i, score)| SectionMatch {
                entry: entries[rows[i].entry_idx].clone(),
                score,
                example: rows[i].example.text.clone(),
            })
            .collect();

        MatchResult {
            legal_code: self.catalog.legal_code(),
            matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_tables;
    use crate::testing::{catalog_with, test_catalog, StubEmbedder};

    fn assert_descending(result: &MatchResult) {
        for pair in result.matches.windows(2) {
            assert!(pair[0].score >= pair[1].score, "{} < {}", pair[0].score, pair[1].score);
        }
    }

    #[tokio::test]
    async fn theft_and_assault_complaint_matches_relevant_sections() {
        let matcher = SectionMatcher::new(test_catalog().await, DuplicatePolicy::Keep);
        let result = matcher
            .classify("my phone was stolen and the thief assaulted me", 3)
            .await
            .unwrap();
        assert_eq!(result.len(), 3);
        assert_descending(&result);
        assert!(
            result
                .codes()
                .iter()
                .any(|c| c == "BNS-303" || c == "BNS-131"),
            "got {:?}",
            result.codes()
        );
    }

    #[tokio::test]
    async fn results_are_bounded_and_reference_the_catalogue() {
        let catalog = test_catalog().await;
        let matcher = SectionMatcher::new(Arc::clone(&catalog), DuplicatePolicy::Keep);
        for k in [0, 1, 3, 50] {
            let result = matcher.classify("someone cheated me", k).await.unwrap();
            assert_eq!(result.len(), k.min(catalog.index().len()));
            assert_descending(&result);
            for entry in result.entries() {
                assert!(catalog.entry(&entry.code).is_some());
            }
        }
    }

    #[tokio::test]
    async fn empty_text_is_scored_not_rejected() {
        let matcher = SectionMatcher::new(test_catalog().await, DuplicatePolicy::Keep);
        let result = matcher.classify("", 3).await.unwrap();
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn ties_keep_catalogue_order() {
        // A zero query vector scores every phrasing 0.0.
        let tables = parse_tables(crate::testing::QUERIES_CSV, crate::testing::SECTIONS_CSV).unwrap();
        let first_codes: Vec<String> = tables.examples.iter().take(3).map(|e| e.code.clone()).collect();
        let first_texts: Vec<String> = tables.examples.iter().take(3).map(|e| e.text.clone()).collect();
        let matcher = SectionMatcher::new(
            catalog_with(Arc::new(StubEmbedder::new(4))).await,
            DuplicatePolicy::Keep,
        );
        let result = matcher.classify("unmapped text", 3).await.unwrap();
        assert_eq!(result.codes(), first_codes);
        let examples: Vec<String> = result.matches.iter().map(|m| m.example.clone()).collect();
        assert_eq!(examples, first_texts);
    }

    #[tokio::test]
    async fn keep_policy_can_repeat_a_section() {
        let embedder = StubEmbedder::new(2)
            .with("someone stole my phone", vec![1.0, 0.0])
            .with("my mobile was stolen", vec![1.0, 0.0])
            .with("phone theft", vec![1.0, 0.0]);
        let matcher = SectionMatcher::new(catalog_with(Arc::new(embedder)).await, DuplicatePolicy::Keep);
        let result = matcher.classify("phone theft", 2).await.unwrap();
        assert_eq!(result.codes(), vec!["BNS-303", "BNS-303"]);
    }

    #[tokio::test]
    async fn collapse_policy_returns_distinct_sections() {
        let embedder = StubEmbedder::new(2)
            .with("someone stole my phone", vec![1.0, 0.0])
            .with("my mobile was stolen", vec![1.0, 0.0])
            .with("the thief assaulted me", vec![0.8, 0.6])
            .with("phone theft", vec![1.0, 0.0]);
        let matcher =
            SectionMatcher::new(catalog_with(Arc::new(embedder)).await, DuplicatePolicy::Collapse);
        let result = matcher.classify("phone theft", 2).await.unwrap();
        assert_eq!(result.codes(), vec!["BNS-303", "BNS-131"]);
        assert_descending(&result);
    }

    #[test]
    fn policy_from_flag() {
        assert_eq!(DuplicatePolicy::from_flag(false), DuplicatePolicy::Keep);
        assert_eq!(DuplicatePolicy::from_flag(true), DuplicatePolicy::Collapse);
    }
}
