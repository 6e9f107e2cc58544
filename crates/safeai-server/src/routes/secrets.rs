//! `POST /v1/secrets/resolve`.
//!
//! Not named in spec.md §6's route table (secrets are otherwise an
//! SDK-only concern), but exposed as one of its "Representative routes" so
//! the capability-gated secret resolution path (C9) is reachable over HTTP
//! too.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

fn default_action() -> String {
    "invoke".to_string()
}

fn default_backend() -> String {
    "env".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ResolveSecretRequest {
    capability_token_id: String,
    secret_key: String,
    agent_id: String,
    tool_name: String,
    #[serde(default = "default_action")]
    action: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default = "default_backend")]
    backend: String,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveSecretRequest>,
) -> Result<Json<Value>, ApiError> {
    let resolved = tokio::task::spawn_blocking(move || {
        state.secrets.resolve_secret(
            &state.capabilities,
            &req.capability_token_id,
            &req.secret_key,
            &req.agent_id,
            &req.tool_name,
            &req.action,
            req.session_id.as_deref(),
            &req.backend,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(json!({ "value": resolved.expose() })))
}
