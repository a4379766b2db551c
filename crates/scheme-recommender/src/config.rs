use std::path::PathBuf;

use crate::error::AppError;

/// Which embedding backend indexes the schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// BGE base model via fastembed (downloads on first run).
    FastEmbed,
    /// Deterministic feature hashing; no model download.
    Hashing,
}

impl EmbeddingBackend {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_lowercase().as_str() {
            "fastembed" => Ok(Self::FastEmbed),
            "hashing" => Ok(Self::Hashing),
            other => Err(AppError::Config(format!(
                "EMBEDDING_BACKEND must be 'fastembed' or 'hashing', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub schemes_path: PathBuf,
    pub listen_addr: String,
    pub embedding_backend: EmbeddingBackend,
    pub max_top_k: usize,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Load configuration from environment variables. Nothing is required.
    ///
    /// - `SCHEMES_FILE` (default "data/Schemes.csv")
    /// - `LISTEN_ADDR` (default "0.0.0.0:5001")
    /// - `EMBEDDING_BACKEND` ("fastembed" or "hashing", default "fastembed")
    /// - `REDIS_URL`
    /// - `RECOMMEND_MAX_TOP_K` (default 50)
    pub fn from_env() -> Result<Self, AppError> {
        let schemes_path = PathBuf::from(var_or("SCHEMES_FILE", "data/Schemes.csv"));
        if !schemes_path.exists() {
            return Err(AppError::Config(format!(
                "scheme table not found at {}",
                schemes_path.display()
            )));
        }

        let raw_max = var_or("RECOMMEND_MAX_TOP_K", "50");
        let max_top_k = raw_max
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|k| *k > 0)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "RECOMMEND_MAX_TOP_K must be a positive integer, got '{raw_max}'"
                ))
            })?;

        Ok(Self {
            redis_url: std::env::var("REDIS_URL").ok(),
            schemes_path,
            listen_addr: var_or("LISTEN_ADDR", "0.0.0.0:5001"),
            embedding_backend: EmbeddingBackend::parse(&var_or("EMBEDDING_BACKEND", "fastembed"))?,
            max_top_k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_backend_parsing() {
        assert_eq!(EmbeddingBackend::parse("hashing").unwrap(), EmbeddingBackend::Hashing);
        assert_eq!(EmbeddingBackend::parse("FASTEMBED").unwrap(), EmbeddingBackend::FastEmbed);
        assert!(EmbeddingBackend::parse("bert").is_err());
    }
}
