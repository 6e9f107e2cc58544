//! `/v1/policies/reload` and `/v1/policies/templates[/{name}]` (spec.md §6).
//!
//! The templates endpoints serve a small, local, built-in catalogue of
//! starter policy-rule documents (`AppState::policy_templates`) — distinct
//! from the community template marketplace fetcher spec.md names as a
//! non-goal.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ReloadRequest {
    #[serde(default)]
    force: bool,
}

pub async fn reload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReloadRequest>,
) -> Result<Json<Value>, ApiError> {
    let force = req.force;
    let reloaded = tokio::task::spawn_blocking(move || {
        if force {
            state.policy.reload().map(|()| true)
        } else {
            state.policy.reload_if_changed()
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(json!({ "reloaded": reloaded })))
}

pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Value> {
    let names: Vec<Value> = state
        .policy_templates
        .iter()
        .map(|t| json!({ "name": t.name, "description": t.description }))
        .collect();
    Json(json!({ "templates": names }))
}

pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let template = state
        .policy_templates
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ApiError::NotFound(format!("policy template '{name}' not found")))?;
    Ok(Json(json!({ "name": template.name, "description": template.description, "yaml": template.yaml })))
}
