/// HTTP-backed implementations of the capability traits.
///
/// - [`WhisperTranscriber`]: `/audio/translations` (speech in any language to English text).
/// - [`LlmTranslator`]: chat completion with a fixed translation prompt.
/// - [`OpenAiSpeechSynthesizer`]: `/audio/speech`.
/// - [`HttpDocumentRenderer`]: JSON `POST {base}/render` to a template renderer service.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::capability::{DocumentRenderer, SpeechSynthesizer, Transcriber, Transcript, Translator};
use crate::error::CommonError;
use crate::language::{normalize_language_code, DEFAULT_LANGUAGE};
use crate::openai::{ChatCompletionRequest, Message, OpenAiClient, SpeechRequest};

pub struct WhisperTranscriber {
    client: Arc<OpenAiClient>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Bytes, file_name: &str) -> Result<Transcript, CommonError> {
        let response = self
            .client
            .audio_translation(&self.model, audio, file_name)
            .await?;
        let language = response
            .language
            .as_deref()
            .map(normalize_language_code)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Ok(Transcript {
            text: response.text.trim().to_string(),
            language,
        })
    }
}

pub struct LlmTranslator {
    client: Arc<OpenAiClient>,
    model: String,
}

impl LlmTranslator {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

fn translation_prompt(target_lang: &str) -> String {
    format!(
        "You are a translation engine. Translate the user's text into the language with \
         ISO-639-1 code '{target_lang}'. Detect the source language automatically. Preserve \
         section numbers, legal codes, numbers and names. Reply with the translation only."
    )
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, CommonError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(translation_prompt(target_lang)),
                Message::user(text),
            ],
            temperature: Some(0.0),
            max_tokens: None,
        };
        let response = self.client.chat_completions(&request).await?;
        response
            .first_content()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CommonError::InvalidResponse("translation missing choices[0].message.content".into())
            })
    }
}

/// Speech voice per language code, with one voice for every unlisted language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechVoices {
    default_voice: String,
    by_language: HashMap<String, String>,
}

impl SpeechVoices {
    pub fn new(default_voice: impl Into<String>) -> Self {
        Self {
            default_voice: default_voice.into(),
            by_language: HashMap::new(),
        }
    }

    pub fn with_language(mut self, lang: impl Into<String>, voice: impl Into<String>) -> Self {
        self.by_language.insert(lang.into(), voice.into());
        self
    }

    pub fn voice_for(&self, lang: &str) -> &str {
        self.by_language
            .get(lang)
            .map_or(self.default_voice.as_str(), String::as_str)
    }
}

/// `/audio/speech` body. The endpoint takes no language parameter; language only selects the voice.
fn speech_request(model: &str, voices: &SpeechVoices, text: &str, lang_code: &str) -> SpeechRequest {
    SpeechRequest {
        model: model.to_string(),
        input: text.to_string(),
        voice: voices.voice_for(lang_code).to_string(),
        response_format: "mp3".to_string(),
    }
}

pub struct OpenAiSpeechSynthesizer {
    client: Arc<OpenAiClient>,
    model: String,
    voices: SpeechVoices,
}

impl OpenAiSpeechSynthesizer {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>, voices: SpeechVoices) -> Self {
        Self {
            client,
            model: model.into(),
            voices,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechSynthesizer {
    async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Bytes, CommonError> {
        let request = speech_request(&self.model, &self.voices, text, lang_code);
        let audio = self.client.speech(&request).await?;
        if audio.is_empty() {
            return Err(CommonError::InvalidResponse("speech synthesis returned no audio".into()));
        }
        Ok(audio)
    }
}

pub struct HttpDocumentRenderer {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    template: &'a str,
    fields: &'a serde_json::Value,
}

impl HttpDocumentRenderer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("sahayak/0.1")
            .build()
            .map_err(|e| CommonError::Render {
                template: String::new(),
                message: format!("http client build failed: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl DocumentRenderer for HttpDocumentRenderer {
    async fn render(
        &self,
        template_id: &str,
        fields: &serde_json::Value,
    ) -> Result<Bytes, CommonError> {
        let render_err = |message: String| CommonError::Render {
            template: template_id.to_string(),
            message,
        };
        let resp = self
            .http
            .post(format!("{}/render", self.base_url))
            .timeout(self.timeout)
            .json(&RenderRequest {
                template: template_id,
                fields,
            })
            .send()
            .await
            .map_err(|e| render_err(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(512).collect();
            return Err(render_err(format!("status={status} body={snippet}")));
        }
        let document = resp
            .bytes()
            .await
            .map_err(|e| render_err(format!("reading body failed: {e}")))?;
        if document.is_empty() {
            return Err(render_err("renderer returned an empty document".to_string()));
        }
        Ok(document)
    }
}
