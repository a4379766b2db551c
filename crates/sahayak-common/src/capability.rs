/// Capability traits for the external collaborators the pipelines sequence.
///
/// These are infrastructure seams only. The speech, translation and rendering engines
/// behind them are opaque; implementations live in `providers` (HTTP) and in test fakes.
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CommonError;

/// Output of the transcription capability: English text plus the detected source language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    /// ISO-639-1 code of the spoken language.
    pub language: String,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> Result<Transcript, CommonError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang` (ISO-639-1). Source language is auto-detected.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, CommonError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `lang_code`, returning encoded audio.
    async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Bytes, CommonError>;
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render the template identified by `template_id` with `fields`, returning document bytes.
    async fn render(
        &self,
        template_id: &str,
        fields: &serde_json::Value,
    ) -> Result<Bytes, CommonError>;
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<String, CommonError>;
}

/// Bundle of every collaborator the complaint pipeline needs, injected at startup.
#[derive(Clone)]
pub struct Capabilities {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub detector: Arc<dyn LanguageDetector>,
}
