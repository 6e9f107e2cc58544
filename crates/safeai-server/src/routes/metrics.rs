//! `GET /v1/metrics`: Prometheus text exposition of [`safeai_telemetry::Metrics`].

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let (decisions, detections_total) = state.metrics.snapshot();

    let mut body = String::new();
    let _ = writeln!(body, "# HELP safeai_decisions_total Boundary decisions by action.");
    let _ = writeln!(body, "# TYPE safeai_decisions_total counter");
    for ((boundary, action), count) in &decisions {
        let _ = writeln!(
            body,
            "safeai_decisions_total{{boundary=\"{boundary}\",action=\"{action}\"}} {count}"
        );
    }
    let _ = writeln!(body, "# HELP safeai_detections_total Classifier detections across every scan.");
    let _ = writeln!(body, "# TYPE safeai_detections_total counter");
    let _ = writeln!(body, "safeai_detections_total {detections_total}");

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
