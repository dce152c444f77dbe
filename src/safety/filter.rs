//! Denylist and statement-count checks.

use regex::Regex;
use std::sync::OnceLock;

use super::{SafetyDecision, SafetyViolation};

/// Keywords whose whole-word presence unconditionally rejects a statement.
pub const DENYLIST: &[&str] = &["DROP", "DELETE", "TRUNCATE", "ALTER", "UPDATE"];

/// Statement separator character.
pub const STATEMENT_SEPARATOR: char = ';';

fn denylist_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DENYLIST
            .iter()
            .map(|keyword| {
                let pattern = format!(r"\b{}\b", keyword);
                let regex = Regex::new(&pattern).expect("denylist pattern is a valid regex");
                (*keyword, regex)
            })
            .collect()
    })
}

/// Trims whitespace and at most one trailing separator, then uppercases.
fn normalize(sql: &str) -> String {
    let trimmed = sql.trim();
    let trimmed = trimmed
        .strip_suffix(STATEMENT_SEPARATOR)
        .unwrap_or(trimmed)
        .trim();
    trimmed.to_uppercase()
}

/// Runs the safety filter and returns the full decision.
pub fn check_sql(sql: &str) -> SafetyDecision {
    let normalized = normalize(sql);

    for (keyword, pattern) in denylist_patterns() {
        if pattern.is_match(&normalized) {
            return SafetyDecision::Rejected(SafetyViolation::DenylistedKeyword(
                (*keyword).to_string(),
            ));
        }
    }

    // Counted on the raw text, independent of the trailing-separator trim.
    let separators = sql.matches(STATEMENT_SEPARATOR).count();
    if separators > 1 {
        return SafetyDecision::Rejected(SafetyViolation::MultipleStatements(separators));
    }

    SafetyDecision::Safe
}

/// Returns true if the statement passes the safety filter.
pub fn is_safe(sql: &str) -> bool {
    check_sql(sql).is_safe()
}
