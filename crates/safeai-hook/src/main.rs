//! `safeai-hook` binary: universal hook adapter for any coding agent.
//!
//! Grounded on `original_source/safeai/cli/hook.py`'s `hook_command`.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use safeai_audit::AuditLogger;
use safeai_classifier::Classifier;
use safeai_hook::{HookEnvelope, HookRunner};
use safeai_policy::{load_path, Engine as PolicyEngine};

/// Universal hook adapter — enforce SafeAI boundaries for any coding agent.
#[derive(Parser, Debug)]
#[command(name = "safeai-hook", about = "Universal hook adapter for coding agent tool calls")]
struct Cli {
    /// Path to the policy rules file.
    #[arg(long, default_value = "safeai.yaml")]
    config: PathBuf,

    /// Path to the audit log file.
    #[arg(long, default_value = "safeai-audit.jsonl")]
    audit_log: PathBuf,

    /// Hook event type (overrides the `event` field on stdin).
    #[arg(long)]
    event: Option<String>,

    /// Agent identifier (overrides the `agent_id` field on stdin).
    #[arg(long)]
    agent_id: Option<String>,

    /// Agent profile name for tool-name mapping (e.g. `claude-code`).
    #[arg(long)]
    profile: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut raw = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut raw) {
        eprintln!("ERROR: failed to read stdin: {err}");
        return ExitCode::from(2);
    }
    let mut envelope: HookEnvelope = match serde_json::from_str(&raw) {
        Ok(env) => env,
        Err(err) => {
            eprintln!("ERROR: invalid JSON on stdin: {err}");
            return ExitCode::from(2);
        }
    };

    let event = cli.event.clone().or_else(|| envelope.event.clone());
    let Some(event) = event else {
        eprintln!("ERROR: no event specified (use --event or include 'event' in stdin JSON)");
        return ExitCode::from(2);
    };
    if let Some(agent_id) = &cli.agent_id {
        envelope.agent_id = agent_id.clone();
    }

    let rules = match load_path(&cli.config) {
        Ok(rules) => rules,
        Err(err) => {
            eprintln!("ERROR: failed to load policy config '{}': {err}", cli.config.display());
            return ExitCode::from(2);
        }
    };
    let policy = Arc::new(PolicyEngine::from_rules(rules));
    let audit = match AuditLogger::open(&cli.audit_log) {
        Ok(logger) => Arc::new(logger),
        Err(err) => {
            eprintln!("ERROR: failed to open audit log '{}': {err}", cli.audit_log.display());
            return ExitCode::from(2);
        }
    };
    let classifier = match Classifier::new(&[]) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("ERROR: failed to build classifier: {err}");
            return ExitCode::from(2);
        }
    };
    let runner = HookRunner::new(classifier, policy, audit);

    let outcome = match event.as_str() {
        "pre_tool_use" => runner.run_pre_tool(&envelope, cli.profile.as_deref()),
        "post_tool_use" => runner.run_post_tool(&envelope),
        other => {
            eprintln!("ERROR: unknown event '{other}'");
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(outcome) if outcome.allowed => ExitCode::from(0),
        Ok(outcome) => {
            println!("BLOCKED: {}", outcome.reason);
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::from(2)
        }
    }
}
