//! `/v1/intercept/tool` and `/v1/intercept/agent-message` (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use safeai_guard::{AgentMessage, ToolCall};

use crate::error::ApiError;
use crate::state::{AppState, ProxyMode};

fn default_capability_action() -> String {
    "invoke".to_string()
}

#[derive(Debug, Deserialize)]
pub struct InterceptToolRequest {
    /// `"request"` or `"response"`.
    phase: String,
    tool_name: String,
    agent_id: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
    #[serde(default)]
    response: Option<Map<String, Value>>,
    #[serde(default)]
    data_tags: Vec<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    source_agent_id: Option<String>,
    #[serde(default)]
    destination_agent_id: Option<String>,
    #[serde(default)]
    capability_token_id: Option<String>,
    #[serde(default = "default_capability_action")]
    capability_action: String,
    #[serde(default)]
    approval_request_id: Option<String>,
}

/// Dispatches on `phase`, building a [`ToolCall`] from the request body and
/// running either [`safeai_guard::ActionInterceptor::intercept_request`] or
/// `intercept_response`. Gateway mode requires `source_agent_id` and
/// `destination_agent_id` (spec.md §6).
pub async fn intercept_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InterceptToolRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.mode == ProxyMode::Gateway
        && (req.source_agent_id.is_none() || req.destination_agent_id.is_none())
    {
        return Err(ApiError::BadRequest(
            "gateway mode requires source_agent_id and destination_agent_id".to_string(),
        ));
    }

    let call = ToolCall {
        tool_name: req.tool_name,
        agent_id: req.agent_id,
        parameters: req.parameters.clone().unwrap_or_default(),
        data_tags: req.data_tags,
        session_id: req.session_id,
        source_agent_id: req.source_agent_id,
        destination_agent_id: req.destination_agent_id,
        action_type: None,
        capability_token_id: req.capability_token_id,
        capability_action: req.capability_action,
        approval_request_id: req.approval_request_id,
    };

    let phase = req.phase;
    let response = req.response.unwrap_or_default();

    let value = tokio::task::spawn_blocking(move || -> Result<Value, ApiError> {
        match phase.as_str() {
            "request" => {
                let result = state.action_interceptor.intercept_request(&call)?;
                Ok(serde_json::to_value(result)?)
            }
            "response" => {
                let result = state.action_interceptor.intercept_response(&call, &response)?;
                Ok(serde_json::to_value(result)?)
            }
            other => Err(ApiError::BadRequest(format!("unknown phase '{other}'"))),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(value))
}

#[derive(Debug, Deserialize)]
pub struct AgentMessageRequest {
    message: String,
    source_agent_id: String,
    destination_agent_id: String,
    #[serde(default)]
    data_tags: Vec<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    approval_request_id: Option<String>,
}

pub async fn intercept_agent_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AgentMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let message = AgentMessage {
        message: req.message,
        source_agent_id: req.source_agent_id,
        destination_agent_id: req.destination_agent_id,
        data_tags: req.data_tags,
        session_id: req.session_id,
        approval_request_id: req.approval_request_id,
    };

    let result = tokio::task::spawn_blocking(move || state.message_pipeline.send(&message))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(serde_json::to_value(result)?))
}
