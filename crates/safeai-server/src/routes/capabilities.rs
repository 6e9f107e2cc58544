//! `/v1/capabilities/issue` and `/v1/capabilities/{token_id}/revoke`.
//!
//! Not named directly in spec.md §6's route table, but the table is
//! described as "Representative routes" and capability tokens (C7) have no
//! other way to reach a live server process; added so
//! `capability_token_id` on `/v1/intercept/tool` is reachable end to end.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IssueCapabilityRequest {
    agent_id: String,
    tool_name: String,
    actions: Vec<String>,
    ttl: String,
    #[serde(default)]
    secret_keys: Vec<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    metadata: Value,
}

pub async fn issue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueCapabilityRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = tokio::task::spawn_blocking(move || {
        state.capabilities.issue(
            req.agent_id,
            req.tool_name,
            req.actions,
            &req.ttl,
            req.secret_keys,
            req.session_id,
            req.metadata,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(serde_json::to_value(token)?))
}

pub async fn revoke(
    State(state): State<Arc<AppState>>,
    Path(token_id): Path<String>,
) -> Json<Value> {
    state.capabilities.revoke(&token_id);
    Json(json!({ "revoked": true }))
}
