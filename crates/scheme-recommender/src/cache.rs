/// Redis caching layer for recommendations.
///
/// Key schema:
/// - `schemes:v1:recommend:{sha256(query|profile|top_k)}`: JSON recommendation list (TTL: 1 hour)
/// - `schemes:v1:catalog_fingerprint`: SHA-256 of the scheme table the cache was filled from
///
/// A changed fingerprint at startup invalidates every `schemes:v1:` key.
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use sahayak_common::api::{RecommendedScheme, UserProfile};
use sahayak_common::redis::RedisCache;

const KEY_PREFIX: &str = "schemes:v1:";
const RECOMMEND_PREFIX: &str = "schemes:v1:recommend:";
const FINGERPRINT_KEY: &str = "schemes:v1:catalog_fingerprint";
const RECOMMEND_TTL_SECS: u64 = 3600;

pub struct RecommendationCache {
    redis: RedisCache,
}

impl RecommendationCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    /// Drop cached recommendations computed against a different scheme table.
    ///
    /// Returns true when the cache was invalidated.
    pub async fn sync_fingerprint(&self, fingerprint: &str) -> bool {
        let stored = self.redis.get(FINGERPRINT_KEY).await;
        if stored.as_deref() == Some(fingerprint) {
            debug!("scheme catalogue fingerprint unchanged");
            return false;
        }
        if !self.redis.delete_by_prefix(KEY_PREFIX).await {
            return false;
        }
        self.redis.set(FINGERPRINT_KEY, fingerprint).await;
        info!(
            previous = stored.as_deref().unwrap_or("none"),
            current = fingerprint,
            "scheme catalogue changed, recommendation cache cleared"
        );
        true
    }

    pub async fn get(&self, key: &str) -> Option<Vec<RecommendedScheme>> {
        self.redis.get_json(key).await
    }

    pub async fn set(&self, key: &str, recommendations: &[RecommendedScheme]) {
        self.redis
            .set_json_with_ttl(key, recommendations, RECOMMEND_TTL_SECS)
            .await;
    }
}

pub fn recommendation_key(query_text: &str, profile: &UserProfile, top_k: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query_text.as_bytes());
    hasher.update(b"|");
    hasher.update(serde_json::to_vec(profile).unwrap_or_default());
    hasher.update(b"|");
    hasher.update(top_k.to_string().as_bytes());
    format!("{RECOMMEND_PREFIX}{:x}", hasher.finalize())
}
