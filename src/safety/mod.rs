//! Static SQL safety filter.
//!
//! Rejects destructive statements and stacked (multi-statement) payloads
//! before anything is executed. The check is purely textual and never
//! consults the model: a rejection here is final.

mod filter;

pub use filter::{check_sql, is_safe, DENYLIST, STATEMENT_SEPARATOR};

use std::fmt;

/// Why the filter rejected a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    /// A denylisted keyword appeared as a whole word.
    DenylistedKeyword(String),
    /// The raw text contained more than one statement separator.
    MultipleStatements(usize),
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DenylistedKeyword(keyword) => write!(f, "denylisted keyword {}", keyword),
            Self::MultipleStatements(count) => {
                write!(f, "{} statement separators, only one statement is allowed", count)
            }
        }
    }
}

/// Outcome of running the safety filter over a candidate statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyDecision {
    /// The statement may be executed.
    Safe,
    /// The statement must not be executed.
    Rejected(SafetyViolation),
}

impl SafetyDecision {
    /// Returns true if the statement passed the filter.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    /// Returns the violation, if any.
    pub fn violation(&self) -> Option<&SafetyViolation> {
        match self {
            Self::Safe => None,
            Self::Rejected(violation) => Some(violation),
        }
    }
}

impl fmt::Display for SafetyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Rejected(violation) => write!(f, "Rejected: {}", violation),
        }
    }
}
