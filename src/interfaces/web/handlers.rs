use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use super::AppState;

#[derive(Deserialize)]
pub struct CommandRequest {
    pub query: String,
    #[serde(default)]
    pub auto_execute: bool,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    10
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "running", "service": "lca-backend" }))
}

/// Main endpoint: resolve a natural-language command, optionally executing
/// the matched or generated script.
pub async fn process_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandRequest>,
) -> axum::response::Response {
    match state.agent.resolve(&payload.query, payload.auto_execute).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("error processing command: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "detail": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn list_commands(State(state): State<AppState>) -> axum::response::Response {
    match state.agent.list_commands().await {
        Ok(commands) => Json(commands).into_response(),
        Err(e) => {
            error!("error listing commands: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "detail": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> axum::response::Response {
    match state.agent.recent_history(params.limit).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            error!("error reading history: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "detail": e.to_string() })),
            )
                .into_response()
        }
    }
}
