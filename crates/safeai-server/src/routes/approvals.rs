//! `/v1/approvals`, `/v1/approvals/{id}`, and its `approve`/`deny` actions.
//!
//! Not named in spec.md §6's route table, but added as one of its
//! "Representative routes" — without these, a `require_approval` decision
//! has no way for a human approver to act on it over HTTP.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let requests =
        tokio::task::spawn_blocking(move || state.approvals.list_requests())
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(json!({ "requests": requests })))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let request = tokio::task::spawn_blocking(move || state.approvals.get(&request_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??
        .ok_or_else(|| ApiError::NotFound("approval request not found".to_string()))?;
    Ok(Json(serde_json::to_value(request)?))
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    approver_id: String,
    #[serde(default)]
    note: Option<String>,
}

async fn decide(
    state: Arc<AppState>,
    request_id: String,
    req: DecideRequest,
    approve: bool,
) -> Result<Json<Value>, ApiError> {
    let decided = tokio::task::spawn_blocking(move || -> Result<Value, ApiError> {
        if state.approvals.get(&request_id)?.is_none() {
            return Err(ApiError::NotFound("approval request not found".to_string()));
        }
        let ok = if approve {
            state.approvals.approve(&request_id, req.approver_id, req.note)?
        } else {
            state.approvals.deny(&request_id, req.approver_id, req.note)?
        };
        if !ok {
            return Err(ApiError::Conflict("approval request already decided".to_string()));
        }
        let request = state.approvals.get(&request_id)?.expect("just decided");
        Ok(serde_json::to_value(request)?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(decided))
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    Json(req): Json<DecideRequest>,
) -> Result<Json<Value>, ApiError> {
    decide(state, request_id, req, true).await
}

pub async fn deny(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    Json(req): Json<DecideRequest>,
) -> Result<Json<Value>, ApiError> {
    decide(state, request_id, req, false).await
}
