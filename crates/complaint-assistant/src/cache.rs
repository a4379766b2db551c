/// Redis caching layer for translations.
///
/// Key schema:
/// - `sahayak:v1:translate:{sha256(lang|text)}`: translated text (TTL: 7 days)
///
/// Failed translations are never cached. Without Redis every call goes to the inner translator.
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use sahayak_common::capability::Translator;
use sahayak_common::error::CommonError;
use sahayak_common::redis::RedisCache;

const KEY_PREFIX: &str = "sahayak:v1:translate:";
const TRANSLATION_TTL_SECS: u64 = 7 * 24 * 3600;

pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    redis: RedisCache,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, redis: RedisCache) -> Self {
        Self { inner, redis }
    }
}

fn translation_key(text: &str, target_lang: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target_lang.as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    format!("{KEY_PREFIX}{:x}", hasher.finalize())
}

#[async_trait]
impl Translator for CachedTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, CommonError> {
        let key = translation_key(text, target_lang);
        if let Some(hit) = self.redis.get(&key).await {
            debug!(target_lang, "translation cache hit");
            return Ok(hit);
        }
        let translated = self.inner.translate(text, target_lang).await?;
        self.redis
            .set_with_ttl(&key, &translated, TRANSLATION_TTL_SECS)
            .await;
        Ok(translated)
    }
}
