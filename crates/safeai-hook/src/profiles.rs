//! Agent profile registry: maps an agent's tool names to canonical SafeAI
//! tool categories (SPEC_FULL.md §6, "Stdio hook").
//!
//! Grounded on `original_source/safeai/agents/profiles.py`'s
//! `AgentProfile`/`_BUILTIN_PROFILES`/`resolve_tool_category`.

use std::collections::HashMap;

/// Maps one agent's tool names to SafeAI categories.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    /// Profile name, e.g. `"claude-code"`.
    pub name: &'static str,
    /// Free-form description.
    pub description: &'static str,
    /// Tool name → category map.
    pub tool_map: HashMap<&'static str, &'static str>,
}

fn claude_code() -> AgentProfile {
    AgentProfile {
        name: "claude-code",
        description: "Anthropic Claude Code CLI",
        tool_map: HashMap::from([
            ("Bash", "shell"),
            ("Write", "file_write"),
            ("Edit", "file_edit"),
            ("Read", "file_read"),
            ("Glob", "search"),
            ("Grep", "search"),
            ("WebFetch", "network"),
            ("WebSearch", "network"),
            ("Task", "agent_dispatch"),
        ]),
    }
}

fn cursor() -> AgentProfile {
    AgentProfile {
        name: "cursor",
        description: "Cursor AI code editor",
        tool_map: HashMap::from([
            ("run_command", "shell"),
            ("write_file", "file_write"),
            ("edit_file", "file_edit"),
            ("read_file", "file_read"),
            ("search_files", "search"),
            ("web_search", "network"),
        ]),
    }
}

fn generic() -> AgentProfile {
    AgentProfile { name: "generic", description: "Generic agent (pass-through tool names)", tool_map: HashMap::new() }
}

/// Looks up a built-in profile by name.
#[must_use]
pub fn get_profile(name: &str) -> Option<AgentProfile> {
    match name {
        "claude-code" => Some(claude_code()),
        "cursor" => Some(cursor()),
        "generic" => Some(generic()),
        _ => None,
    }
}

/// Maps `tool_name` to its SafeAI category via `profile`, falling back to
/// the tool name itself when unmapped or no profile is given.
#[must_use]
pub fn resolve_tool_category<'a>(tool_name: &'a str, profile: Option<&'a AgentProfile>) -> &'a str {
    profile.and_then(|p| p.tool_map.get(tool_name).copied()).unwrap_or(tool_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_code_maps_bash_to_shell() {
        let profile = get_profile("claude-code").unwrap();
        assert_eq!(resolve_tool_category("Bash", Some(&profile)), "shell");
    }

    #[test]
    fn unmapped_tool_falls_back_to_its_own_name() {
        let profile = get_profile("claude-code").unwrap();
        assert_eq!(resolve_tool_category("CustomTool", Some(&profile)), "CustomTool");
    }

    #[test]
    fn no_profile_passes_tool_name_through() {
        assert_eq!(resolve_tool_category("Bash", None), "Bash");
    }

    #[test]
    fn unknown_profile_name_returns_none() {
        assert!(get_profile("nonexistent").is_none());
    }
}
