//! Compact duration grammar shared by capability TTLs, approval TTLs, and
//! memory retention: `^\d+[smhdw]$` (spec.md §4.7 "Duration grammar").

use std::time::Duration;

use crate::error::{Result, SafeAiError};

/// Parse a compact duration string (`"30s"`, `"15m"`, `"2h"`, `"7d"`, `"2w"`).
pub fn parse_duration(value: &str) -> Result<Duration> {
    let trimmed = value.trim();
    let (digits, unit) = trimmed.split_at(trimmed.len().saturating_sub(1));
    let amount: u64 = digits
        .parse()
        .map_err(|_| SafeAiError::InvalidDuration(value.to_string()))?;
    let seconds = match unit {
        "s" => amount,
        "m" => amount.saturating_mul(60),
        "h" => amount.saturating_mul(3_600),
        "d" => amount.saturating_mul(86_400),
        "w" => amount.saturating_mul(604_800),
        _ => return Err(SafeAiError::InvalidDuration(value.to_string())),
    };
    if digits.is_empty() {
        return Err(SafeAiError::InvalidDuration(value.to_string()));
    }
    Ok(Duration::from_secs(seconds))
}

/// Parse a compact "last N" window (`"30s"`..`"2w"`), identical grammar to
/// [`parse_duration`] but named separately for call-site clarity in audit
/// query code (spec.md §4.4 "a compact `last` duration").
pub fn parse_last_window(value: &str) -> Result<Duration> {
    parse_duration(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(2 * 3_600));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(2 * 604_800));
    }

    #[test]
    fn rejects_malformed_grammar() {
        assert!(parse_duration("tomorrow").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("-5s").is_err());
    }
}
