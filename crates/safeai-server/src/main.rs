//! `safeai-server` binary: the HTTP sidecar/gateway entrypoint (spec
//! component C17, spec.md §6).
//!
//! Directory *layout* under `SAFEAI_CONFIG` is explicitly out of scope
//! (SPEC_FULL.md §6); this composition root demonstrates one convention —
//! `policy/*.yaml`, `contracts/*.yaml`, `identities/*.yaml`,
//! `memory/*.yaml`, `alerts.yaml` — as a minimal example, grounded on
//! `safeai-hook`'s `main.rs` for the "load registries, fail loudly at
//! start-up" shape.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use safeai_alerts::{Alert, AlertChannel, AlertEvaluator, AlertRuleDocument, FileChannel, SlackChannel, WebhookChannel};
use safeai_approval::ApprovalManager;
use safeai_audit::AuditLogger;
use safeai_capability::CapabilityTokenManager;
use safeai_classifier::Classifier;
use safeai_contracts::{ToolContractDocument, ToolContractRegistry};
use safeai_identity::{AgentIdentityDocument, AgentIdentityRegistry};
use safeai_memory::{MemoryRegistry, MemorySchemaDocument};
use safeai_policy::Engine as PolicyEngine;
use safeai_secrets::SecretManager;
use safeai_server::routes::build_router;
use safeai_server::state::{AppState, ProxyMode};
use safeai_telemetry::{init_json_logging, Metrics};

/// HTTP sidecar/gateway enforcing SafeAI boundaries in front of an agent.
#[derive(Parser, Debug)]
#[command(name = "safeai-server", about = "Runtime policy enforcement HTTP surface")]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Config directory (defaults to `SAFEAI_CONFIG`, falling back to `./config`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audit log path, relative to the config directory unless absolute.
    #[arg(long, default_value = "audit.jsonl")]
    audit_log: PathBuf,

    /// Approval store path, relative to the config directory unless absolute.
    #[arg(long, default_value = "approvals.jsonl")]
    approvals_file: PathBuf,
}

fn yaml_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("yaml" | "yml" | "json")))
        .collect();
    paths.sort();
    paths
}

fn load_contracts(dir: &Path) -> anyhow::Result<ToolContractRegistry> {
    let mut tools = Vec::new();
    for path in yaml_files_in(dir) {
        let text = std::fs::read_to_string(&path)?;
        let doc: ToolContractDocument = serde_yaml::from_str(&text)?;
        tools.extend(doc.tools);
    }
    Ok(ToolContractRegistry::from_contracts(tools)?)
}

fn load_identities(dir: &Path) -> anyhow::Result<AgentIdentityRegistry> {
    let mut agents = Vec::new();
    for path in yaml_files_in(dir) {
        let text = std::fs::read_to_string(&path)?;
        let doc: AgentIdentityDocument = serde_yaml::from_str(&text)?;
        agents.extend(doc.agents);
    }
    Ok(AgentIdentityRegistry::from_identities(agents)?)
}

fn load_memory(dir: &Path) -> anyhow::Result<MemoryRegistry> {
    let mut schemas = Vec::new();
    for path in yaml_files_in(dir) {
        let text = std::fs::read_to_string(&path)?;
        let doc: MemorySchemaDocument = serde_yaml::from_str(&text)?;
        schemas.extend(doc.schemas);
    }
    Ok(MemoryRegistry::from_schemas(schemas)?)
}

/// Builds the fixed name->channel map a loaded `AlertRule.channels` entry
/// resolves against. `alerts.yaml` only names channels; it carries no
/// endpoint configuration (no on-disk schema for it exists), so this
/// mapping is the embedder's job, demonstrated here from environment
/// variables (DESIGN.md "alert channel instances").
fn build_alert_channels(config_dir: &Path) -> HashMap<String, Box<dyn AlertChannel>> {
    let mut channels: HashMap<String, Box<dyn AlertChannel>> = HashMap::new();
    channels.insert(
        "file".to_string(),
        Box::new(FileChannel::new(config_dir.join("alerts.log"))),
    );
    if let Ok(url) = std::env::var("SAFEAI_ALERT_WEBHOOK_URL") {
        channels.insert("webhook".to_string(), Box::new(WebhookChannel::new(url)));
    }
    if let Ok(url) = std::env::var("SAFEAI_ALERT_SLACK_WEBHOOK_URL") {
        channels.insert("slack".to_string(), Box::new(SlackChannel::new(url)));
    }
    channels
}

fn load_alerts(config_dir: &Path, evaluator: &AlertEvaluator) -> anyhow::Result<()> {
    let path = config_dir.join("alerts.yaml");
    if !path.exists() {
        return Ok(());
    }
    let text = std::fs::read_to_string(&path)?;
    let doc: AlertRuleDocument = serde_yaml::from_str(&text)?;
    for rule in doc.alert_rules {
        evaluator.register_rule(rule)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_json_logging();
    let cli = Cli::parse();

    let config_dir = cli
        .config
        .or_else(|| std::env::var("SAFEAI_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./config"));
    std::fs::create_dir_all(&config_dir)?;

    let classifier = Classifier::new(&[])?;

    let policy = Arc::new(PolicyEngine::new());
    let policy_paths = yaml_files_in(&config_dir.join("policy"));
    if !policy_paths.is_empty() {
        policy.register_reload(policy_paths, safeai_policy::load_paths)?;
    }

    let audit_path = if cli.audit_log.is_absolute() { cli.audit_log } else { config_dir.join(cli.audit_log) };
    let audit = Arc::new(AuditLogger::open(&audit_path)?);

    let contracts = Arc::new(load_contracts(&config_dir.join("contracts"))?);
    let identities = Arc::new(load_identities(&config_dir.join("identities"))?);
    let capabilities = Arc::new(CapabilityTokenManager::new());

    let approvals_path =
        if cli.approvals_file.is_absolute() { cli.approvals_file } else { config_dir.join(cli.approvals_file) };
    let approvals = Arc::new(ApprovalManager::open(&approvals_path)?);

    let secrets = Arc::new(SecretManager::new());
    let memory = Arc::new(load_memory(&config_dir.join("memory"))?);

    let alerts = Arc::new(AlertEvaluator::new());
    load_alerts(&config_dir, &alerts)?;
    let alert_channels = Arc::new(build_alert_channels(&config_dir));

    {
        let alerts = alerts.clone();
        let channels = alert_channels.clone();
        audit.on_emit(move |event| {
            for alert in alerts.observe(event) {
                dispatch_and_log(&alert, &channels);
            }
        });
    }

    let metrics = Metrics::new();
    {
        let metrics = metrics.clone();
        audit.on_emit(move |event| {
            metrics.record_decision(event.boundary, event.action);
            if let Some(count) = event.metadata.get("detection_count").and_then(serde_json::Value::as_u64) {
                metrics.record_detections(count);
            }
        });
    }

    let mode = ProxyMode::from_env();
    let upstream_base_url = std::env::var("SAFEAI_UPSTREAM_BASE_URL").ok();

    let state = Arc::new(AppState::new(
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
        mode,
        upstream_base_url,
    ));

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, ?mode, "safeai-server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

fn dispatch_and_log(alert: &Alert, channels: &HashMap<String, Box<dyn AlertChannel>>) {
    let results = safeai_alerts::dispatch_alert(alert, channels, &alert.channels);
    for (channel, ok) in results {
        if !ok {
            tracing::warn!(alert_id = %alert.alert_id, %channel, "alert dispatch failed or channel unknown");
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
