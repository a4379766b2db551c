/// HTTP boundary for scheme recommendations.
///
/// Routes:
/// - `POST /recommend-schemes`: JSON `{user_query, user_profile, top_k}`
/// - `GET /health`
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use sahayak_common::api::{RecommendRequest, RecommendationResponse};

use crate::recommender::SchemeRecommender;

pub struct AppState {
    pub recommender: SchemeRecommender,
    pub schemes: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recommend-schemes", post(recommend_schemes))
        .route("/health", get(health))
        .with_state(state)
}

async fn recommend_schemes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> Response {
    match state
        .recommender
        .recommend(&request.user_query, &request.user_profile, request.top_k)
        .await
    {
        Ok(recommendations) => Json(RecommendationResponse { recommendations }).into_response(),
        Err(e) => {
            error!(error = %e, "recommendation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "schemes": state.schemes }))
}
