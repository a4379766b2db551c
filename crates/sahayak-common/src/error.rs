/// Error types shared across the service crates.
///
/// These errors represent failures in infrastructure components (Redis, embeddings, the
/// external speech/translation/rendering collaborators) that both services talk to.
/// Service-specific errors are defined in each binary crate and wrap `CommonError` via `#[from]`.
use crate::openai::OpenAiClientError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error(transparent)]
    Upstream(#[from] OpenAiClientError),

    #[error("render failed for template {template}: {message}")]
    Render { template: String, message: String },

    #[error("language detection failed: {0}")]
    LanguageDetection(String),

    #[error("unexpected collaborator response: {0}")]
    InvalidResponse(String),
}
