use std::path::{Path, PathBuf};
use std::time::Duration;

use sahayak_common::providers::SpeechVoices;

use crate::error::AppError;

/// Which embedding backend indexes the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Pretrained sentence-transformers model (downloads on first run).
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

/// Application configuration loaded explicitly from environment variables.
///
/// Only the renderer endpoint is required; everything else has a default suited to
/// running from the repository root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL. `None` disables translation caching.
    pub redis_url: Option<String>,
    pub queries_path: PathBuf,
    pub sections_path: PathBuf,
    /// On-disk directory generated audio and letters are written to.
    pub output_dir: PathBuf,
    /// Public URL prefix under which `output_dir` is served.
    pub public_url_prefix: String,
    pub listen_addr: String,
    pub max_upload_bytes: usize,
    pub top_k: usize,
    pub deduplicate_matches: bool,
    pub embedding_backend: EmbeddingBackend,
    pub renderer_url: String,
    pub renderer_timeout: Duration,
    pub transcription_model: String,
    pub translation_model: String,
    pub speech_model: String,
    pub speech_voices: SpeechVoices,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// `SPEECH_VOICES` entries look like `hi=nova,ta=shimmer`.
fn parse_speech_voices(default_voice: &str, raw: &str) -> Result<SpeechVoices, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .try_fold(SpeechVoices::new(default_voice), |voices, entry| {
            match entry.split_once('=').map(|(l, v)| (l.trim(), v.trim())) {
                Some((lang, voice)) if !lang.is_empty() && !voice.is_empty() => {
                    Ok(voices.with_language(lang.to_lowercase(), voice))
                }
                _ => Err(AppError::Config(format!(
                    "SPEECH_VOICES entry '{entry}' must look like 'hi=nova'"
                ))),
            }
        })
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: '{raw}'"))),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RENDERER_URL`: base URL of the HTML-to-PDF template renderer
    ///
    /// Optional:
    /// - `CATALOG_DIR` (default "data"), `CATALOG_QUERIES_FILE` (default "BNS_Queries.csv"),
    ///   `CATALOG_SECTIONS_FILE` (default "BNS_Section.csv")
    /// - `OUTPUT_DIR` (default "static/bns_outputs"), `PUBLIC_URL_PREFIX`
    ///   (default "/static/bns_outputs")
    /// - `LISTEN_ADDR` (default "0.0.0.0:5000"), `MAX_UPLOAD_BYTES` (default 25 MiB)
    /// - `MATCH_TOP_K` (default 3), `MATCH_DEDUPLICATE` (default false)
    /// - `EMBEDDING_BACKEND` ("fastembed" or "hashing", default "fastembed")
    /// - `REDIS_URL`
    /// - `TRANSCRIPTION_MODEL`, `TRANSLATION_MODEL`, `SPEECH_MODEL`
    /// - `SPEECH_VOICE` (default "alloy") and `SPEECH_VOICES` per-language overrides
    ///   such as "hi=nova,ta=shimmer"
    pub fn from_env() -> Result<Self, AppError> {
        let renderer_url = std::env::var("RENDERER_URL").map_err(|_| {
            AppError::Config("RENDERER_URL environment variable is required".to_string())
        })?;

        let catalog_dir = PathBuf::from(var_or("CATALOG_DIR", "data"));
        let queries_path = catalog_dir.join(var_or("CATALOG_QUERIES_FILE", "BNS_Queries.csv"));
        let sections_path = catalog_dir.join(var_or("CATALOG_SECTIONS_FILE", "BNS_Section.csv"));
        for path in [&queries_path, &sections_path] {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "catalogue table not found at {}",
                    path.display()
                )));
            }
        }

        let top_k = parse_var("MATCH_TOP_K", 3usize)?;
        if top_k == 0 {
            return Err(AppError::Config("MATCH_TOP_K must be at least 1".to_string()));
        }

        Ok(Self {
            redis_url: std::env::var("REDIS_URL").ok(),
            queries_path,
            sections_path,
            output_dir: PathBuf::from(var_or("OUTPUT_DIR", "static/bns_outputs")),
            public_url_prefix: var_or("PUBLIC_URL_PREFIX", "/static/bns_outputs"),
            listen_addr: var_or("LISTEN_ADDR", "0.0.0.0:5000"),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
            top_k,
            deduplicate_matches: parse_var("MATCH_DEDUPLICATE", false)?,
            embedding_backend: EmbeddingBackend::parse(&var_or("EMBEDDING_BACKEND", "fastembed"))?,
            renderer_url,
            renderer_timeout: Duration::from_secs(parse_var("RENDERER_TIMEOUT_SECS", 60u64)?),
            transcription_model: var_or("TRANSCRIPTION_MODEL", "whisper-1"),
            translation_model: var_or("TRANSLATION_MODEL", "gpt-4o-mini"),
            speech_model: var_or("SPEECH_MODEL", "tts-1"),
            speech_voices: parse_speech_voices(
                &var_or("SPEECH_VOICE", "alloy"),
                &var_or("SPEECH_VOICES", ""),
            )?,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
