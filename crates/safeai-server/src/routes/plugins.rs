//! `GET /v1/plugins` (spec.md §6): lists the extra detector triples the
//! classifier was built with, beyond its built-in catalogue.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn list_plugins(State(state): State<Arc<AppState>>) -> Json<Value> {
    let plugins: Vec<Value> = state
        .plugins
        .iter()
        .map(|(name, tag, pattern)| json!({ "name": name, "tag": tag, "pattern": pattern }))
        .collect();
    Json(json!({ "plugins": plugins }))
}
