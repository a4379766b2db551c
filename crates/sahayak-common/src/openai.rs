/// Client for OpenAI-compatible inference endpoints.
///
/// Covers the three endpoints the services consume: chat completions (translation),
/// audio translations (whisper transcription into English) and audio speech (TTS).
/// Transient failures (connect/timeout, 429, 5xx) are retried with capped exponential
/// backoff inside the client; callers never retry on top of it.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_timeout: Duration,
    /// Audio uploads and speech synthesis run much longer than chat calls.
    pub audio_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl OpenAiClientConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            default_timeout: Duration::from_secs(env_or("OPENAI_TIMEOUT_SECS", 30)),
            audio_timeout: Duration::from_secs(env_or("OPENAI_AUDIO_TIMEOUT_SECS", 180)),
            max_retries: env_or("OPENAI_MAX_RETRIES", 3),
            initial_backoff: Duration::from_millis(env_or("OPENAI_RETRY_INITIAL_MS", 200)),
            max_backoff: Duration::from_millis(env_or("OPENAI_RETRY_MAX_MS", 5_000)),
            max_error_body_bytes: env_or("OPENAI_MAX_ERROR_BODY_BYTES", 8 * 1024),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },
}

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiClientConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiClientError> {
        let http = reqwest::Client::builder()
            .user_agent("sahayak/0.1")
            .build()?;
        Ok(Self { config, http })
    }

    fn post(&self, path: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.config.base_url);
        let req = self.http.post(url).timeout(timeout);
        match &self.config.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    pub async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiClientError> {
        self.request_with_retry(|| async {
            let resp = self
                .post("/chat/completions", self.config.default_timeout)
                .json(request)
                .send()
                .await?;
            self.parse_json_response(resp).await
        })
        .await
    }

    /// Transcribe audio into English text, reporting the detected source language.
    ///
    /// Uses the `verbose_json` response format, which carries the `language` field.
    pub async fn audio_translation(
        &self,
        model: &str,
        audio: Bytes,
        file_name: &str,
    ) -> Result<AudioTranslationResponse, OpenAiClientError> {
        self.request_with_retry(|| {
            // Multipart forms are consumed on send, so each attempt builds its own.
            let part =
                reqwest::multipart::Part::bytes(audio.to_vec()).file_name(file_name.to_string());
            let form = reqwest::multipart::Form::new()
                .text("model", model.to_string())
                .text("response_format", "verbose_json")
                .part("file", part);
            async move {
                let resp = self
                    .post("/audio/translations", self.config.audio_timeout)
                    .multipart(form)
                    .send()
                    .await?;
                self.parse_json_response(resp).await
            }
        })
        .await
    }

    /// Synthesize speech, returning the encoded audio bytes (MP3 by default).
    pub async fn speech(&self, request: &SpeechRequest) -> Result<Bytes, OpenAiClientError> {
        self.request_with_retry(|| async {
            let resp = self
                .post("/audio/speech", self.config.audio_timeout)
                .json(request)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(self.to_upstream_error(resp).await);
            }
            Ok(resp.bytes().await?)
        })
        .await
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, OpenAiClientError> {
        if !resp.status().is_success() {
            return Err(self.to_upstream_error(resp).await);
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice::<T>(&body)?)
    }

    async fn to_upstream_error(&self, resp: reqwest::Response) -> OpenAiClientError {
        let status = resp.status();
        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        match serde_json::from_str::<OpenAiErrorEnvelope>(&body) {
            Ok(parsed) => OpenAiClientError::Upstream {
                status,
                message: parsed
                    .error
                    .message
                    .unwrap_or_else(|| "unknown upstream error".to_string()),
            },
            Err(_) => OpenAiClientError::UpstreamBody { status, body },
        }
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, OpenAiClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, OpenAiClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match f().await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };
            if attempt > self.config.max_retries || !should_retry(&err) {
                return Err(err);
            }
            let delay = backoff_delay(
                self.config.initial_backoff,
                self.config.max_backoff,
                attempt - 1,
            );
            warn!(
                attempt,
                delay_ms = delay.as_millis(),
                error = %err,
                "upstream request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn should_retry(err: &OpenAiClientError) -> bool {
    match err {
        OpenAiClientError::Request(e) => e.is_timeout() || e.is_connect(),
        OpenAiClientError::Upstream { status, .. }
        | OpenAiClientError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        OpenAiClientError::InvalidJson(_) => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(capped_ms.saturating_add(nanos % (jitter_cap + 1)))
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(b) => String::from_utf8_lossy(&b[..b.len().min(max_bytes)]).to_string(),
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorObject,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the upstream returned one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// `verbose_json` body of `/audio/translations`.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioTranslationResponse {
    pub text: String,
    /// Detected source language. Whisper servers report either a name ("hindi") or a code.
    pub language: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: String,
}
