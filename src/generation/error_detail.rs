//! Classification of database diagnostics for the corrective prompt.
//!
//! Recognizes the three error shapes a model can act on directly and pulls
//! out the offending identifier. MySQL and PostgreSQL phrasings are both
//! understood.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A recognized database error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape {
    UnknownColumn,
    MissingTable,
    AmbiguousColumn,
}

impl ErrorShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownColumn => "unknown column",
            Self::MissingTable => "missing table",
            Self::AmbiguousColumn => "ambiguous column",
        }
    }
}

impl fmt::Display for ErrorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The offending identifier and the shape it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub shape: ErrorShape,
    pub identifier: String,
}

/// Patterns in precedence order; the first match wins.
fn patterns() -> &'static [(ErrorShape, Regex)] {
    static PATTERNS: OnceLock<Vec<(ErrorShape, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (ErrorShape::UnknownColumn, r"Unknown column '([^']+)'"),
            (
                ErrorShape::UnknownColumn,
                r#"column "?([^"\s]+)"?(?: of relation "[^"]+")? does not exist"#,
            ),
            (ErrorShape::MissingTable, r"Table '([^']+)' doesn't exist"),
            (ErrorShape::MissingTable, r#"relation "([^"]+)" does not exist"#),
            (
                ErrorShape::AmbiguousColumn,
                r"Column '([^']+)' in field list is ambiguous",
            ),
            (
                ErrorShape::AmbiguousColumn,
                r#"column reference "([^"]+)" is ambiguous"#,
            ),
        ]
        .into_iter()
        .map(|(shape, pattern)| {
            let regex = Regex::new(pattern).expect("error detail pattern is a valid regex");
            (shape, regex)
        })
        .collect()
    })
}

/// Classifies a raw database error message.
///
/// Returns `None` when the message matches none of the known shapes.
pub fn classify_error(message: &str) -> Option<ErrorDetail> {
    patterns().iter().find_map(|(shape, regex)| {
        regex.captures(message).and_then(|caps| {
            caps.get(1).map(|m| ErrorDetail {
                shape: *shape,
                identifier: m.as_str().to_string(),
            })
        })
    })
}

/// Returns the offending identifier, or the message unmodified when no
/// shape matches.
pub fn extract_detail(message: &str) -> String {
    classify_error(message)
        .map(|detail| detail.identifier)
        .unwrap_or_else(|| message.to_string())
}
