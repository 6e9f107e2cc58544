//! `/v1/memory/{write|read|resolve-handle|purge-expired}` (spec.md §6),
//! each keyed by a `schema` name resolved through [`safeai_memory::MemoryRegistry`].

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

fn schema_not_found(schema: &str) -> ApiError {
    ApiError::NotFound(format!("memory schema '{schema}' not found"))
}

#[derive(Debug, Deserialize)]
pub struct MemoryWriteRequest {
    schema: String,
    agent_id: String,
    key: String,
    value: Value,
}

pub async fn write(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryWriteRequest>,
) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let controller = state.memory.controller(&req.schema).ok_or_else(|| schema_not_found(&req.schema))?;
        let written = controller.write(&req.agent_id, &req.key, req.value);
        Ok::<_, ApiError>(Json(json!({ "written": written })))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

#[derive(Debug, Deserialize)]
pub struct MemoryReadRequest {
    schema: String,
    agent_id: String,
    key: String,
}

pub async fn read(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryReadRequest>,
) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let controller = state.memory.controller(&req.schema).ok_or_else(|| schema_not_found(&req.schema))?;
        let value = controller.read(&req.agent_id, &req.key);
        Ok::<_, ApiError>(Json(json!({ "value": value })))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

#[derive(Debug, Deserialize)]
pub struct MemoryResolveHandleRequest {
    schema: String,
    handle_id: String,
    agent_id: String,
}

pub async fn resolve_handle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryResolveHandleRequest>,
) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let controller = state.memory.controller(&req.schema).ok_or_else(|| schema_not_found(&req.schema))?;
        let value = controller.resolve_handle(&req.handle_id, &req.agent_id, &state.policy, &state.audit);
        Ok::<_, ApiError>(Json(json!({ "value": value })))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

#[derive(Debug, Deserialize)]
pub struct MemoryPurgeExpiredRequest {
    schema: String,
}

/// Purges expired entries across every agent within `schema`'s controller
/// (`MemoryController::purge_expired` has no per-agent notion; spec.md §4.13).
pub async fn purge_expired(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryPurgeExpiredRequest>,
) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || {
        let controller = state.memory.controller(&req.schema).ok_or_else(|| schema_not_found(&req.schema))?;
        let purged = controller.purge_expired(&state.audit);
        Ok::<_, ApiError>(Json(json!({ "purged": purged })))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}
