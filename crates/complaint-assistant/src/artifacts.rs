/// Generated-file layout: unique names, the on-demand output directory and public URLs.
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use sahayak_common::language::DEFAULT_LANGUAGE;

use crate::error::AppError;

/// Languages with a dedicated letter template and speech output.
const SUPPORTED_LANGUAGES: [&str; 6] = ["hi", "en", "gu", "ta", "bn", "pa"];

/// HTML letter template for a language, falling back to English.
pub fn template_for_language(lang: &str) -> String {
    format!("bns_complaint_template_{}.html", supported_or_default(lang))
}

/// Language speech is synthesized in, falling back to English.
pub fn speech_language(lang: &str) -> &'static str {
    supported_or_default(lang)
}

fn supported_or_default(lang: &str) -> &'static str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| **l == lang)
        .copied()
        .unwrap_or(DEFAULT_LANGUAGE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    EnglishLetter,
    RegionalLetter,
}

impl ArtifactKind {
    fn file_name(self, id: Uuid) -> String {
        match self {
            Self::Audio => format!("bns_output_{id}.mp3"),
            Self::EnglishLetter => format!("bns_letter_english_{id}.pdf"),
            Self::RegionalLetter => format!("bns_letter_regional_{id}.pdf"),
        }
    }
}

/// A file written for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub url: String,
}

/// Writes artifacts under one directory and maps them to URLs under one public prefix.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    public_prefix: String,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            public_prefix: format!("/{}", public_prefix.trim_matches('/')),
        }
    }

    /// Public URL for a file inside the output directory.
    pub fn public_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.output_dir).unwrap_or(path);
        let tail = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{tail}", self.public_prefix)
    }

    /// Write `bytes` under a fresh random name for `kind`. The directory is created on demand.
    pub async fn write(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<StoredArtifact, AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(kind.file_name(Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        let url = self.public_url(&path);
        Ok(StoredArtifact { path, url })
    }

    /// Remove files written for a request that ultimately failed.
    pub async fn discard(&self, artifacts: &[StoredArtifact]) {
        for artifact in artifacts {
            if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
                warn!(error = %e, path = %artifact.path.display(), "failed to remove artifact");
            }
        }
    }
}
