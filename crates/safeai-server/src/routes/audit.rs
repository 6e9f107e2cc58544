//! `POST /v1/audit/query` (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use safeai_audit::AuditFilter;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<AuditFilter>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let events = tokio::task::spawn_blocking(move || safeai_audit::query(&state.audit, &filter))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(json!({ "count": events.len(), "events": events })))
}
