//! Dangerous shell-command pattern matching (SPEC_FULL.md §6, "Stdio hook").
//!
//! Grounded on `original_source/safeai/cli/hook.py`'s
//! `_DANGEROUS_PATTERNS`/`_classify_dangerous_command`.

use once_cell::sync::Lazy;
use regex::Regex;

static DANGEROUS_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"rm\s+-[^\s]*r[^\s]*f[^\s]*\s+[/~.](?:\s|$)").unwrap(), "recursive delete of root/home/cwd"),
        (Regex::new(r"rm\s+-[^\s]*f[^\s]*r[^\s]*\s+[/~.](?:\s|$)").unwrap(), "recursive delete of root/home/cwd"),
        (Regex::new(r"(?i)\bDROP\s+(TABLE|DATABASE)\b").unwrap(), "DROP TABLE/DATABASE"),
        (Regex::new(r"(?i)\bTRUNCATE\b").unwrap(), "TRUNCATE"),
        (Regex::new(r"\bmkfs\b").unwrap(), "mkfs (format filesystem)"),
        (Regex::new(r"\bdd\s+if=").unwrap(), "dd (raw disk write)"),
        (Regex::new(r">\s*/dev/sd[a-z]").unwrap(), "write to raw disk device"),
        (Regex::new(r"chmod\s+(-R\s+)?777\b").unwrap(), "chmod 777"),
        (Regex::new(r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:").unwrap(), "fork bomb"),
        (Regex::new(r"git\s+push\s+--force\b.*\b(main|master)\b").unwrap(), "force push to main/master"),
        (Regex::new(r"git\s+push\b.*\b(main|master)\b.*--force\b").unwrap(), "force push to main/master"),
        (Regex::new(r"curl\s+.*\|\s*(sh|bash)\b").unwrap(), "pipe-to-shell (curl)"),
        (Regex::new(r"wget\s+.*\|\s*(sh|bash)\b").unwrap(), "pipe-to-shell (wget)"),
    ]
});

/// Returns a reason string if `text` matches a known dangerous shell
/// command pattern.
#[must_use]
pub fn classify_dangerous_command(text: &str) -> Option<&'static str> {
    DANGEROUS_PATTERNS.iter().find(|(re, _)| re.is_match(text)).map(|(_, reason)| *reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_recursive_delete_of_root() {
        assert_eq!(classify_dangerous_command("rm -rf /"), Some("recursive delete of root/home/cwd"));
    }

    #[test]
    fn flags_force_push_to_main() {
        assert!(classify_dangerous_command("git push --force origin main").is_some());
    }

    #[test]
    fn ignores_safe_commands() {
        assert!(classify_dangerous_command("ls -la /tmp").is_none());
    }
}
