//! `/v1/scan/input`, `/v1/scan/structured`, `/v1/scan/file` (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use safeai_core::Boundary;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanInputRequest {
    text: String,
    agent_id: String,
}

pub async fn scan_input(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanInputRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = tokio::task::spawn_blocking(move || state.input_scanner.scan(&req.text, &req.agent_id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(serde_json::to_value(result)?))
}

#[derive(Debug, Deserialize)]
pub struct ScanStructuredRequest {
    payload: Value,
    agent_id: String,
}

pub async fn scan_structured(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanStructuredRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = tokio::task::spawn_blocking(move || {
        state.structured_scanner.scan(&req.payload, &req.agent_id, Boundary::Input)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(serde_json::to_value(result)?))
}

#[derive(Debug, Deserialize)]
pub struct ScanFileRequest {
    path: String,
    agent_id: String,
}

/// Reads `path` from disk, then dispatches to the structured scanner if it
/// parses as JSON or the text scanner otherwise, tagging the response with
/// `mode` (spec.md §6).
pub async fn scan_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanFileRequest>,
) -> Result<Json<Value>, ApiError> {
    let value = tokio::task::spawn_blocking(move || -> Result<Value, ApiError> {
        let contents = std::fs::read_to_string(&req.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ApiError::NotFound(format!("file '{}' not found", req.path))
            } else {
                ApiError::Internal(e.to_string())
            }
        })?;

        if let Ok(parsed) = serde_json::from_str::<Value>(&contents) {
            let result = state.structured_scanner.scan(&parsed, &req.agent_id, Boundary::Input)?;
            let mut value = serde_json::to_value(result)?;
            value["mode"] = Value::String("structured".to_string());
            Ok(value)
        } else {
            let result = state.input_scanner.scan(&contents, &req.agent_id)?;
            let mut value = serde_json::to_value(result)?;
            value["mode"] = Value::String("text".to_string());
            Ok(value)
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(value))
}
