//! `POST /v1/proxy/forward` (spec.md §6): input-scans the outbound body,
//! forwards it to `upstream_url` (or `upstream_url` joined onto
//! `SAFEAI_UPSTREAM_BASE_URL` when it isn't already absolute), then
//! output-guards the response body before returning it.
//!
//! Grounded on `examples/riverline-labs-tenor/crates/cli/src/template/registry.rs`'s
//! `ureq::Agent::new_with_defaults()` request/response handling and its
//! `extract_status_from_ureq_error` fallback for reading a status code back
//! out of a non-2xx `ureq::Error`.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyForwardRequest {
    method: String,
    upstream_url: String,
    #[serde(default)]
    json_body: Option<Value>,
    #[serde(default)]
    text_body: Option<String>,
    agent_id: String,
}

fn extract_status_from_ureq_error(msg: &str) -> Option<u16> {
    for word in msg.split_whitespace() {
        let clean = word.trim_matches(|c: char| !c.is_ascii_digit());
        if clean.len() == 3 {
            if let Ok(code) = clean.parse::<u16>() {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }
    None
}

fn resolve_url(state: &AppState, upstream_url: &str) -> String {
    if upstream_url.starts_with("http://") || upstream_url.starts_with("https://") {
        return upstream_url.to_string();
    }
    match &state.upstream_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), upstream_url.trim_start_matches('/')),
        None => upstream_url.to_string(),
    }
}

fn send(method: &str, url: &str, body: &str) -> Result<(u16, String), (u16, String)> {
    let agent = ureq::Agent::new_with_defaults();
    let outcome = match method.to_uppercase().as_str() {
        "GET" => agent.get(url).call(),
        "DELETE" => agent.delete(url).call(),
        "POST" => agent.post(url).header("Content-Type", "application/json").send(body),
        "PUT" => agent.put(url).header("Content-Type", "application/json").send(body),
        "PATCH" => agent.patch(url).header("Content-Type", "application/json").send(body),
        other => return Err((400, format!("unsupported method '{other}'"))),
    };

    match outcome {
        Ok(response) => {
            let status = response.status().as_u16();
            let text = response.into_body().read_to_string().unwrap_or_default();
            Ok((status, text))
        }
        Err(e) => {
            let msg = e.to_string();
            let status = extract_status_from_ureq_error(&msg).unwrap_or(502);
            Err((status, msg))
        }
    }
}

/// Input-scans the request body, forwards it unless the decision blocks,
/// then output-guards the response body (spec.md §6).
pub async fn forward(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProxyForwardRequest>,
) -> Result<Json<Value>, ApiError> {
    let outbound = req
        .text_body
        .clone()
        .or_else(|| req.json_body.as_ref().map(|v| v.to_string()))
        .unwrap_or_default();

    let url = resolve_url(&state, &req.upstream_url);
    let method = req.method;
    let agent_id = req.agent_id;

    let value = tokio::task::spawn_blocking(move || -> Result<Value, ApiError> {
        let scan = state.input_scanner.scan(&outbound, &agent_id)?;
        if scan.decision.is_non_allow() {
            return Ok(json!({
                "decision": scan.decision,
                "body": scan.text,
                "status_code": Value::Null,
            }));
        }

        match send(&method, &url, &scan.text) {
            Ok((status, response_body)) => {
                let guarded = state.output_guard.guard(&response_body, &agent_id)?;
                Ok(json!({
                    "decision": guarded.decision,
                    "body": guarded.text,
                    "status_code": status,
                }))
            }
            Err((status, message)) => Ok(json!({
                "decision": scan.decision,
                "body": message,
                "status_code": status,
            })),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(value))
}
