//! Route modules, one per HTTP-table concern (spec.md §6). Mirrors the
//! per-concern module split `safeai-guard` already uses for its pipelines.

mod approvals;
mod audit;
mod capabilities;
mod guard;
mod health;
mod intercept;
mod memory;
mod metrics;
mod plugins;
mod policies;
mod proxy;
mod scan;
mod secrets;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Builds the full `/v1/...` router over a shared [`AppState`].
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health::health))
        .route("/v1/scan/input", post(scan::scan_input))
        .route("/v1/scan/structured", post(scan::scan_structured))
        .route("/v1/scan/file", post(scan::scan_file))
        .route("/v1/guard/output", post(guard::guard_output))
        .route("/v1/intercept/tool", post(intercept::intercept_tool))
        .route("/v1/intercept/agent-message", post(intercept::intercept_agent_message))
        .route("/v1/memory/write", post(memory::write))
        .route("/v1/memory/read", post(memory::read))
        .route("/v1/memory/resolve-handle", post(memory::resolve_handle))
        .route("/v1/memory/purge-expired", post(memory::purge_expired))
        .route("/v1/audit/query", post(audit::query))
        .route("/v1/policies/reload", post(policies::reload))
        .route("/v1/policies/templates", get(policies::list_templates))
        .route("/v1/policies/templates/{name}", get(policies::get_template))
        .route("/v1/plugins", get(plugins::list_plugins))
        .route("/v1/metrics", get(metrics::metrics))
        .route("/v1/proxy/forward", post(proxy::forward))
        .route("/v1/capabilities/issue", post(capabilities::issue))
        .route("/v1/capabilities/{token_id}/revoke", post(capabilities::revoke))
        .route("/v1/secrets/resolve", post(secrets::resolve))
        .route("/v1/approvals", get(approvals::list))
        .route("/v1/approvals/{request_id}", get(approvals::get))
        .route("/v1/approvals/{request_id}/approve", post(approvals::approve))
        .route("/v1/approvals/{request_id}/deny", post(approvals::deny))
        .with_state(state)
}
