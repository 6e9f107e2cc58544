//! Category-specific scannable-text extraction (SPEC_FULL.md §6, "Stdio
//! hook").
//!
//! Grounded on `original_source/safeai/cli/hook.py`'s `_extract_text`.

use serde_json::Value;

use crate::profiles::{resolve_tool_category, AgentProfile};

const SHELL_CATEGORIES: [&str; 3] = ["shell", "Bash", "run_command"];

fn field<'a>(input: &'a serde_json::Map<String, Value>, keys: &[&str]) -> &'a str {
    keys.iter().find_map(|k| input.get(*k).and_then(Value::as_str)).unwrap_or("")
}

/// Whether `tool_name`/`category` denotes a shell-executing tool.
#[must_use]
pub fn is_shell_category(tool_name: &str, category: &str) -> bool {
    SHELL_CATEGORIES.contains(&category) || SHELL_CATEGORIES.contains(&tool_name)
}

/// Extracts the scannable text from `tool_input`, dispatching on the
/// category `tool_name` resolves to under `profile`.
#[must_use]
pub fn extract_text(tool_name: &str, tool_input: &Value, profile: Option<&AgentProfile>) -> String {
    if let Some(text) = tool_input.as_str() {
        return text.to_string();
    }
    let Some(input) = tool_input.as_object() else { return String::new() };
    let category = resolve_tool_category(tool_name, profile);

    if is_shell_category(tool_name, category) {
        return field(input, &["command", "cmd"]).to_string();
    }
    match category {
        "file_write" | "file_edit" => field(input, &["content", "new_string", "text"]).to_string(),
        "search" => field(input, &["pattern", "query"]).to_string(),
        "network" => field(input, &["url", "query"]).to_string(),
        _ => input
            .values()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
    }
}
