/// HTTP boundary for the complaint pipeline.
///
/// Routes:
/// - `POST /api/bns-chat`: multipart upload (`audio` or `audio_file`, plus optional `name`,
///   `location`, `age`, `gender`, `phone`, `id_number`, `email` text fields)
/// - `GET /health`
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use tracing::warn;

use sahayak_common::api::{NumberOrText, UserProfile};

use crate::pipeline::ComplaintPipeline;

pub struct AppState {
    pub pipeline: Arc<ComplaintPipeline>,
    pub sections: usize,
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/bns-chat", post(bns_chat))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

struct AudioUpload {
    bytes: Bytes,
    file_name: String,
}

#[derive(Default)]
struct ComplaintForm {
    audio: Option<AudioUpload>,
    profile: UserProfile,
}

async fn read_form(multipart: &mut Multipart) -> Result<ComplaintForm, String> {
    let mut form = ComplaintForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("invalid multipart body: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" | "audio_file" => {
                // First audio part wins.
                if form.audio.is_some() {
                    continue;
                }
                let file_name = field.file_name().unwrap_or("audio.wav").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("failed to read audio upload: {e}"))?;
                if !bytes.is_empty() {
                    form.audio = Some(AudioUpload { bytes, file_name });
                }
            }
            "name" | "location" | "age" | "gender" | "phone" | "id_number" | "email" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("failed to read field '{name}': {e}"))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                let p = &mut form.profile;
                match name.as_str() {
                    "name" => p.name = value,
                    "location" => p.location = value,
                    "age" => p.age = value.map(NumberOrText::Text),
                    "gender" => p.gender = value,
                    "phone" => p.phone = value,
                    "id_number" => p.id = value,
                    _ => p.email = value,
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

async fn bns_chat(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(message) => {
            warn!(error = %message, "rejected complaint upload");
            return bad_request(message);
        }
    };
    let Some(audio) = form.audio else {
        return bad_request("No audio file provided");
    };

    let response = state
        .pipeline
        .run(audio.bytes, audio.file_name, form.profile)
        .await;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response)).into_response()
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "sections": state.sections }))
}
