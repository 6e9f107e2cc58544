//! Composition root: wires every registry/manager into the pipeline
//! objects the route handlers call (spec component C17).
//!
//! Grounded on `examples/riverline-labs-tenor/crates/cli/src/serve/state.rs`
//! for the `Arc<AppState>`-over-`axum::State` shape, since the teacher's own
//! HTTP-adjacent crate (`orchestrator`) is tonic/gRPC and has no axum
//! counterpart to ground this file on directly.

use std::collections::HashMap;
use std::sync::Arc;

use safeai_alerts::{AlertChannel, AlertEvaluator};
use safeai_approval::ApprovalManager;
use safeai_audit::AuditLogger;
use safeai_capability::CapabilityTokenManager;
use safeai_classifier::{Classifier, DetectorDef};
use safeai_contracts::ToolContractRegistry;
use safeai_guard::{ActionInterceptor, AgentMessagePipeline, InputScanner, OutputGuard, StructuredScanner};
use safeai_identity::AgentIdentityRegistry;
use safeai_memory::MemoryRegistry;
use safeai_policy::Engine as PolicyEngine;
use safeai_secrets::SecretManager;
use safeai_telemetry::Metrics;

/// Selects which side of the proxy this process acts as (spec.md §6).
/// Gateway mode requires `source_agent_id`/`destination_agent_id` on tool
/// interception; sidecar mode does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    /// Runs alongside one agent process; no cross-agent routing fields
    /// required.
    Sidecar,
    /// Sits between agents (or an agent and an upstream); requires
    /// `source_agent_id`/`destination_agent_id` on `/v1/intercept/tool`.
    Gateway,
}

impl ProxyMode {
    /// Reads `SAFEAI_PROXY_MODE` (`"sidecar"` or `"gateway"`), defaulting to
    /// `Sidecar` when unset or unrecognized.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("SAFEAI_PROXY_MODE").as_deref() {
            Ok("gateway") => Self::Gateway,
            _ => Self::Sidecar,
        }
    }
}

/// One starter policy-rule template exposed through `/v1/policies/templates`.
#[derive(Debug, Clone)]
pub struct PolicyTemplate {
    /// Template name, addressed as `/v1/policies/templates/{name}`.
    pub name: String,
    /// Human-readable summary.
    pub description: &'static str,
    /// The template's YAML body.
    pub yaml: &'static str,
}

/// One extra detector triple advertised through `GET /v1/plugins`. The
/// classifier's `DetectorDef` is `'static`-bound (spec.md §4.1 "users and
/// plugins contribute additional triples"), so a live, config-file-sourced
/// plugin registry cannot be built at runtime; this workspace instead
/// demonstrates the extension point with a small compile-time catalogue
/// (SPEC_FULL.md §6 "embedder's job, demonstrated only by a minimal
/// example").
pub fn plugin_catalogue() -> &'static [DetectorDef] {
    &[]
}

fn builtin_templates() -> Vec<PolicyTemplate> {
    vec![
        PolicyTemplate {
            name: "default-deny".to_string(),
            description: "blocks every boundary outright; start here and allowlist down",
            yaml: "rules:\n  - name: deny-all\n    boundary: [input, output, action, memory]\n    action: block\n    reason: \"default-deny starter policy\"\n    priority: 1000\n",
        },
        PolicyTemplate {
            name: "block-secrets".to_string(),
            description: "blocks credential-shaped detections on input and output",
            yaml: "rules:\n  - name: block-secrets\n    boundary: [input, output]\n    action: block\n    reason: \"secrets are never allowed across input/output\"\n    priority: 10\n    condition:\n      data_tags: secret.credential\n",
        },
        PolicyTemplate {
            name: "redact-pii".to_string(),
            description: "redacts personal data on input instead of blocking it",
            yaml: "rules:\n  - name: redact-pii\n    boundary: [input]\n    action: redact\n    reason: \"redact personal data\"\n    priority: 20\n    condition:\n      data_tags: [personal.pii]\n",
        },
    ]
}

/// Every shared handle and composed pipeline a route handler needs.
/// Constructed once at start-up and shared behind one `Arc`.
pub struct AppState {
    /// Shared pattern classifier, cloned into each boundary pipeline.
    pub classifier: Classifier,
    /// Policy engine (first-match, default-deny, hot-reloadable).
    pub policy: Arc<PolicyEngine>,
    /// Append-only audit log.
    pub audit: Arc<AuditLogger>,
    /// Tool contract registry.
    pub contracts: Arc<ToolContractRegistry>,
    /// Agent identity registry.
    pub identities: Arc<AgentIdentityRegistry>,
    /// Capability token manager.
    pub capabilities: Arc<CapabilityTokenManager>,
    /// Approval workflow manager.
    pub approvals: Arc<ApprovalManager>,
    /// Secret manager.
    pub secrets: Arc<SecretManager>,
    /// Per-schema memory controllers.
    pub memory: Arc<MemoryRegistry>,
    /// Sliding-window alert evaluator.
    pub alerts: Arc<AlertEvaluator>,
    /// Alert channel instances, keyed by the name an `AlertRule.channels`
    /// entry references.
    pub alert_channels: Arc<HashMap<String, Box<dyn AlertChannel>>>,
    /// In-process decision/detection counters for `/v1/metrics`.
    pub metrics: Metrics,
    /// Scalar-text input boundary pipeline.
    pub input_scanner: InputScanner,
    /// Scalar-text output boundary pipeline.
    pub output_guard: OutputGuard,
    /// Structured-payload boundary pipeline, reused at both input and
    /// output boundaries depending on the caller.
    pub structured_scanner: StructuredScanner,
    /// Tool-call request/response interception pipeline.
    pub action_interceptor: ActionInterceptor,
    /// Agent-to-agent message interception pipeline.
    pub message_pipeline: AgentMessagePipeline,
    /// Sidecar vs. gateway mode.
    pub mode: ProxyMode,
    /// Upstream base URL for `/v1/proxy/forward`, from `SAFEAI_UPSTREAM_BASE_URL`.
    pub upstream_base_url: Option<String>,
    /// Static plugin catalogue for `GET /v1/plugins`.
    pub plugins: &'static [DetectorDef],
    /// Static starter policy templates for `/v1/policies/templates`.
    pub policy_templates: Vec<PolicyTemplate>,
}

impl AppState {
    /// Builds the composition root from already-loaded registries/managers,
    /// cloning the classifier into each boundary pipeline it composes.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        classifier: Classifier,
        policy: Arc<PolicyEngine>,
        audit: Arc<AuditLogger>,
        contracts: Arc<ToolContractRegistry>,
        identities: Arc<AgentIdentityRegistry>,
        capabilities: Arc<CapabilityTokenManager>,
        approvals: Arc<ApprovalManager>,
        secrets: Arc<SecretManager>,
        memory: Arc<MemoryRegistry>,
        alerts: Arc<AlertEvaluator>,
        alert_channels: Arc<HashMap<String, Box<dyn AlertChannel>>>,
        metrics: Metrics,
        mode: ProxyMode,
        upstream_base_url: Option<String>,
    ) -> Self {
        let input_scanner = InputScanner::new(classifier.clone(), policy.clone(), audit.clone());
        let output_guard = OutputGuard::new(classifier.clone(), policy.clone(), audit.clone());
        let structured_scanner = StructuredScanner::new(classifier.clone(), policy.clone(), audit.clone());
        let action_interceptor = ActionInterceptor::new(
            classifier.clone(),
            policy.clone(),
            contracts.clone(),
            identities.clone(),
            capabilities.clone(),
            approvals.clone(),
            audit.clone(),
        );
        let message_pipeline =
            AgentMessagePipeline::new(classifier.clone(), policy.clone(), approvals.clone(), audit.clone());

        Self {
            classifier,
            policy,
            audit,
            contracts,
            identities,
            capabilities,
            approvals,
            secrets,
            memory,
            alerts,
            alert_channels,
            metrics,
            input_scanner,
            output_guard,
            structured_scanner,
            action_interceptor,
            message_pipeline,
            mode,
            upstream_base_url,
            plugins: plugin_catalogue(),
            policy_templates: builtin_templates(),
        }
    }
}
