//! `GET /v1/health`.

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe; never touches the composed pipelines.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
