//! Hierarchical dotted data tags (spec.md §3 "Tag", C2 "Tag hierarchy").

use std::collections::BTreeSet;

/// Pattern a tag must satisfy: lowercase, starts with a letter, then
/// alphanumerics/`_`/`.`/`-`.
fn is_valid_tag(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
}

/// Trim, lower-case, and strip empty dot segments (`"a..b"` -> `"a.b"`).
///
/// Returns `None` if the normalized value is empty or fails the tag grammar.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let joined = lowered
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    if joined.is_empty() || !is_valid_tag(&joined) {
        return None;
    }
    Some(joined)
}

/// Expand a single normalized tag into the set of all its dot-prefixes.
///
/// `expand_one("a.b.c")` -> `{"a", "a.b", "a.b.c"}`.
fn expand_one(tag: &str) -> impl Iterator<Item = String> + '_ {
    let parts: Vec<&str> = tag.split('.').filter(|s| !s.is_empty()).collect();
    (1..=parts.len()).map(move |idx| parts[..idx].join("."))
}

/// Expand a collection of raw tags into the union of all dot-prefixes of
/// each normalized tag (spec.md C2 `expand`).
///
/// Invalid/empty tags are silently dropped, mirroring the original's
/// `_coerce_values`/`expand_tag_hierarchy` tolerance of junk input.
pub fn expand_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expanded = BTreeSet::new();
    for raw in tags {
        if let Some(normalized) = normalize_tag(raw.as_ref()) {
            expanded.extend(expand_one(&normalized));
        }
    }
    expanded
}

/// True iff any tag in `policy_tags` is a dot-prefix ancestor of any tag in
/// `context_tags` (hierarchical match, spec.md §8 invariant 2).
pub fn tags_intersect_hierarchically<I, J>(policy_tags: I, context_tags: J) -> bool
where
    I: IntoIterator<Item = String>,
    J: IntoIterator<Item = String>,
{
    let policy_lower: BTreeSet<String> = policy_tags
        .into_iter()
        .filter_map(|t| normalize_tag(&t))
        .collect();
    if policy_lower.is_empty() {
        return false;
    }
    let expanded_context = expand_tags(context_tags);
    policy_lower.iter().any(|tag| expanded_context.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_strips_empty_segments() {
        assert_eq!(normalize_tag("  A..B  ").as_deref(), Some("a.b"));
        assert_eq!(normalize_tag("Personal.PII").as_deref(), Some("personal.pii"));
    }

    #[test]
    fn rejects_tags_not_starting_with_letter() {
        assert_eq!(normalize_tag("1abc"), None);
        assert_eq!(normalize_tag(""), None);
        assert_eq!(normalize_tag("..."), None);
    }

    #[test]
    fn expands_full_ancestor_chain() {
        let expanded = expand_tags(["personal.pii.ssn"]);
        assert_eq!(
            expanded,
            ["personal", "personal.pii", "personal.pii.ssn"]
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn parent_matches_child_not_vice_versa() {
        assert!(tags_intersect_hierarchically(
            ["personal".to_string()],
            ["personal.pii".to_string()]
        ));
        assert!(!tags_intersect_hierarchically(
            ["personal.pii".to_string()],
            ["personal".to_string()]
        ));
    }
}
