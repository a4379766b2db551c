/// Profile-aware scheme recommendation: rank schemes by embedding similarity, then keep
/// the best eligible ones.
use std::sync::Arc;

use tracing::{debug, info};

use sahayak_common::api::{NumberOrText, RecommendedScheme, UserProfile};
use sahayak_common::embedding::cosine_similarity;

use crate::cache::{recommendation_key, RecommendationCache};
use crate::catalog::SchemeCatalog;
use crate::eligibility::is_eligible;
use crate::error::AppError;

pub const DEFAULT_TOP_K: usize = 5;

fn field(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

struct ProfileFields {
    gender: String,
    caste: String,
    income: String,
    occupation: String,
    state: String,
    age: String,
}

impl ProfileFields {
    fn of(profile: &UserProfile) -> Self {
        Self {
            gender: field(profile.gender.clone()),
            caste: field(profile.caste.clone()),
            income: field(profile.income.as_ref().map(NumberOrText::display)),
            occupation: field(profile.occupation.as_ref().map(|o| o.display())),
            state: field(profile.state.clone()),
            age: field(profile.age.as_ref().map(NumberOrText::display)),
        }
    }
}

/// Query text used when the caller sends none.
pub fn synthesize_query(profile: &UserProfile) -> String {
    let p = ProfileFields::of(profile);
    format!(
        "I am a {}-year-old {} from {}, belonging to the {} caste, working as a {}. \
         My annual income is ₹{}.",
        p.age, p.gender, p.state, p.caste, p.occupation, p.income
    )
}

fn profile_context(profile: &UserProfile) -> String {
    let p = ProfileFields::of(profile);
    format!(
        "gender: {}, caste: {}, income: {}, occupation: {}, state: {}, age: {}",
        p.gender, p.caste, p.income, p.occupation, p.state, p.age
    )
}

/// Text embedded for a request: the (possibly synthesized) query plus profile context.
pub fn query_text(query: &str, profile: &UserProfile) -> String {
    let query = query.trim();
    let query = if query.is_empty() {
        synthesize_query(profile)
    } else {
        query.to_string()
    };
    format!(
        "Represent this government benefit query for retrieval: {query} Context: {}",
        profile_context(profile)
    )
}

fn round4(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}

pub struct SchemeRecommender {
    catalog: Arc<SchemeCatalog>,
    cache: RecommendationCache,
    max_top_k: usize,
}

impl SchemeRecommender {
    pub fn new(catalog: Arc<SchemeCatalog>, cache: RecommendationCache, max_top_k: usize) -> Self {
        Self {
            catalog,
            cache,
            max_top_k,
        }
    }

    /// `None` falls back to the default; larger requests are clamped.
    pub fn effective_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(DEFAULT_TOP_K).min(self.max_top_k)
    }

    /// Up to `top_k` eligible schemes, best match first.
    ///
    /// Fewer results than asked for is a normal outcome when few schemes are eligible.
    pub async fn recommend(
        &self,
        query: &str,
        profile: &UserProfile,
        top_k: Option<usize>,
    ) -> Result<Vec<RecommendedScheme>, AppError> {
        let top_k = self.effective_top_k(top_k);
        let text = query_text(query, profile);
        let key = recommendation_key(&text, profile, top_k);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(results = hit.len(), "recommendation cache hit");
            return Ok(hit);
        }

        let query_vector = self.catalog.embed_query(&text).await?;
        let recommendations = self.rank(&query_vector, profile, top_k);
        info!(
            synthesized = query.trim().is_empty(),
            top_k,
            results = recommendations.len(),
            "recommendations computed"
        );
        self.cache.set(&key, &recommendations).await;
        Ok(recommendations)
    }

    fn rank(&self, query: &[f32], profile: &UserProfile, top_k: usize) -> Vec<RecommendedScheme> {
        let schemes = self.catalog.schemes();
        let mut scored: Vec<(usize, f32)> = schemes
            .iter()
            .enumerate()
            .map(|(i, s)| (i, cosine_similarity(query, &s.vector)))
            .collect();
        // Stable: equal scores stay in table order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .filter(|(i, _)| is_eligible(&schemes[*i].entry, profile))
            .take(top_k)
            .map(|(i, score)| schemes[i].entry.to_recommendation(round4(score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{student_profile, test_catalog, STUDENT_ELIGIBLE};
    use sahayak_common::redis::RedisCache;

    async fn recommender() -> SchemeRecommender {
        recommender_with_max(50).await
    }

    fn eligible_names(recommender: &SchemeRecommender, profile: &UserProfile) -> Vec<String> {
        recommender
            .catalog
            .schemes()
            .iter()
            .filter(|s| is_eligible(&s.entry, profile))
            .map(|s| s.entry.name.clone())
            .collect()
    }

    #[test]
    fn synthesized_query_uses_profile() {
        assert_eq!(
            synthesize_query(&student_profile()),
            "I am a 19-year-old female from delhi, belonging to the sc caste, working as a \
             student. My annual income is ₹150000."
        );
    }

    #[test]
    fn query_text_carries_context() {
        let text = query_text("  scholarship for college  ", &student_profile());
        assert_eq!(
            text,
            "Represent this government benefit query for retrieval: scholarship for college \
             Context: gender: female, caste: sc, income: 150000, occupation: student, \
             state: delhi, age: 19"
        );
        let empty = query_text("", &UserProfile::default());
        assert!(empty.contains("I am a unknown-year-old unknown from unknown"));
    }

    #[test]
    fn scores_round_to_four_places() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    #[tokio::test]
    async fn empty_query_student_profile_gets_only_eligible_schemes() {
        let recommender = recommender().await;
        let profile = student_profile();
        let results = recommender.recommend("", &profile, None).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= DEFAULT_TOP_K);

        let mut names: Vec<&str> = results.iter().map(|r| r.scheme_name.as_str()).collect();
        names.sort_unstable();
        let mut expected = STUDENT_ELIGIBLE.to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);

        for pair in results.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
    }

    #[tokio::test]
    async fn never_returns_ineligible_schemes() {
        let recommender = recommender().await;
        let mut profile = student_profile();
        profile.gender = Some("male".into());
        profile.caste = Some("obc".into());
        let allowed = eligible_names(&recommender, &profile);
        for query in ["", "pension", "scholarship", "farmer support"] {
            let results = recommender.recommend(query, &profile, Some(9)).await.unwrap();
            assert!(results.len() <= allowed.len());
            for r in &results {
                assert!(allowed.contains(&r.scheme_name), "{} is ineligible", r.scheme_name);
            }
        }
    }

    #[tokio::test]
    async fn results_are_bounded_by_top_k() {
        let recommender = recommender().await;
        let profile = student_profile();
        for k in [0, 1, 2] {
            let results = recommender
                .recommend("education", &profile, Some(k))
                .await
                .unwrap();
            assert_eq!(results.len(), k);
        }
    }

    #[tokio::test]
    async fn unknown_age_skips_age_checks_only() {
        let recommender = recommender().await;
        let mut profile = student_profile();
        profile.age = Some(NumberOrText::Text("unknown".into()));
        let results = recommender
            .recommend("pension", &profile, Some(9))
            .await
            .unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.scheme_name.as_str()).collect();
        assert!(names.contains(&"Indira Gandhi National Old Age Pension"));
        assert!(!names.contains(&"PM Kisan Samman Nidhi"));
        assert!(!names.contains(&"Ladli Scheme Delhi"));
    }

    #[tokio::test]
    async fn top_k_defaults_and_clamps() {
        let recommender = SchemeRecommender::new(
            test_catalog().await,
            RecommendationCache::new(RedisCache::disabled()),
            2,
        );
        assert_eq!(recommender.effective_top_k(None), 2);
        assert_eq!(recommender.effective_top_k(Some(1)), 1);
        assert_eq!(recommender.effective_top_k(Some(500)), 2);
        let results = recommender
            .recommend("", &student_profile(), Some(500))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let roomy = recommender_with_max(50).await;
        assert_eq!(roomy.effective_top_k(None), DEFAULT_TOP_K);
    }

    async fn recommender_with_max(max_top_k: usize) -> SchemeRecommender {
        SchemeRecommender::new(
            test_catalog().await,
            RecommendationCache::new(RedisCache::disabled()),
            max_top_k,
        )
    }
}
