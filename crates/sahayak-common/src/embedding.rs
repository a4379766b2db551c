/// Sentence embeddings for catalogue retrieval.
///
/// `TextEmbedding` from fastembed is synchronous and CPU-bound. All embed calls go through
/// `tokio::task::spawn_blocking`, with the model shared behind an `Arc`.
///
/// Two backends implement [`TextEmbedder`]:
/// - [`Embedder`]: a pretrained sentence-transformers model via fastembed.
/// - [`HashingEmbedder`]: deterministic token feature hashing, for offline runs and tests.
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::CommonError;

/// Produces fixed-length vectors for text. Implementations must be safe to share across requests.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of catalogue texts, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CommonError>;

    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;
}

/// Pretrained models used by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingModelKind {
    /// all-MiniLM-L6-v2 (384 dimensions), used for legal-section matching.
    MiniLm,
    /// BAAI/bge-base-en-v1.5 (768 dimensions), used for scheme retrieval.
    BgeBase,
}

impl EmbeddingModelKind {
    fn fastembed_model(self) -> fastembed::EmbeddingModel {
        match self {
            Self::MiniLm => fastembed::EmbeddingModel::AllMiniLML6V2,
            Self::BgeBase => fastembed::EmbeddingModel::BGEBaseENV15,
        }
    }

    pub fn dimensions(self) -> usize {
        match self {
            Self::MiniLm => 384,
            Self::BgeBase => 768,
        }
    }
}

/// Wraps fastembed's `TextEmbedding` model for generating vector embeddings.
pub struct Embedder {
    model: Arc<fastembed::TextEmbedding>,
    kind: EmbeddingModelKind,
}

impl Embedder {
    /// Initialize the embedding model.
    ///
    /// This downloads the model on first run. The download happens synchronously
    /// inside a blocking task.
    pub async fn new(kind: EmbeddingModelKind) -> Result<Self, CommonError> {
        let model = tokio::task::spawn_blocking(move || {
            let options = fastembed::InitOptions::new(kind.fastembed_model())
                .with_show_download_progress(true);
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| CommonError::Embedding(format!("model initialization failed: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
            kind,
        })
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    /// Documents are processed in small batches to bound peak memory during ONNX inference.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let owned = texts.to_vec();
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(owned, Some(16)))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("document embedding failed: {e}")))
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CommonError> {
        let input = vec![text.to_string()];
        let model = Arc::clone(&self.model);
        let mut results = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("query embedding failed: {e}")))?;
        results
            .pop()
            .ok_or_else(|| CommonError::Embedding("empty embedding result".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.kind.dimensions()
    }
}

/// Bag-of-words embedder using signed feature hashing over lower-cased word tokens.
///
/// Texts sharing words score higher under cosine similarity. No model download, fully
/// deterministic, so catalogue loads are reproducible bit-for-bit.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]) as usize
                % self.dim;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(&mut v);
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

#[async_trait]
impl TextEmbedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CommonError> {
        Ok(self.embed_text(text))
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity of two vectors. Zero-length or zero-norm input scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed_text("My phone was stolen");
        let b = embedder.embed_text("my PHONE was stolen!");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[test]
    fn hashing_embedder_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(64);
        let v = embedder.embed_text("   ");
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn shared_words_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_text("my phone was stolen at the market");
        let theft = embedder.embed_text("someone stole my phone at the market");
        let fire = embedder.embed_text("a fire destroyed our crops");
        assert!(cosine_similarity(&query, &theft) > cosine_similarity(&query, &fire));
    }

    #[tokio::test]
    async fn hashing_embedder_batch_preserves_order() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vecs = embedder.embed_documents(&texts).await.unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(vecs[0], embedder.embed_text("alpha"));
        assert_eq!(vecs[1], embedder.embed_text("beta"));
        assert_eq!(embedder.dimensions(), 32);
    }
}
