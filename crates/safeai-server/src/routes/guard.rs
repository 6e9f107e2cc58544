//! `POST /v1/guard/output` (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GuardOutputRequest {
    text: String,
    agent_id: String,
}

pub async fn guard_output(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GuardOutputRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = tokio::task::spawn_blocking(move || state.output_guard.guard(&req.text, &req.agent_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(serde_json::to_value(result)?))
}
