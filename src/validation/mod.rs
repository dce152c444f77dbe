//! Semantic validation of generated SQL.
//!
//! A second completion call judges the statement for syntax, safety and
//! schema compatibility and answers with a small JSON verdict. Model output
//! is untrusted: anything that fails to decode becomes an invalid verdict,
//! never an error.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::llm::prompt::build_validation_prompt;
use crate::llm::{sanitize_sql, strip_code_fence, LlmClient};

/// Reason reported when the verdict could not be decoded.
pub const PARSE_FAILURE_REASON: &str = "could not parse validation result";

/// Reason reported when the verdict lacks one.
pub const UNKNOWN_REASON: &str = "unknown validation error";

/// The validator's judgement of one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub reason: String,
    /// Replacement SQL proposed for an invalid statement.
    pub suggested_fix: Option<String>,
}

impl ValidationVerdict {
    /// An invalid verdict with no fix.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: reason.into(),
            suggested_fix: None,
        }
    }

    /// Returns the fix when the verdict is invalid and carries one.
    pub fn fix(&self) -> Option<&str> {
        if self.is_valid {
            None
        } else {
            self.suggested_fix.as_deref()
        }
    }
}

/// Wire shape of the verdict. Every field is optional.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    is_valid: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    suggested_fix: Option<String>,
}

impl From<RawVerdict> for ValidationVerdict {
    fn from(raw: RawVerdict) -> Self {
        let suggested_fix = raw
            .suggested_fix
            .map(|fix| sanitize_sql(&fix))
            .filter(|fix| !fix.is_empty());

        Self {
            is_valid: raw.is_valid.unwrap_or(false),
            reason: raw.reason.unwrap_or_else(|| UNKNOWN_REASON.to_string()),
            suggested_fix,
        }
    }
}

/// Decodes a completion into a verdict. Never fails.
///
/// A bare JSON object is decoded as is, so a fenced `suggested_fix` inside it
/// is not mistaken for the outer fence.
pub fn parse_verdict(response: &str) -> ValidationVerdict {
    let decoded = serde_json::from_str::<RawVerdict>(response.trim())
        .or_else(|_| serde_json::from_str::<RawVerdict>(strip_code_fence(response)));

    match decoded {
        Ok(raw) => raw.into(),
        Err(e) => {
            warn!("Failed to parse validation result: {}", e);
            debug!("Raw validation response: {}", response);
            ValidationVerdict::invalid(PARSE_FAILURE_REASON)
        }
    }
}

/// Completion-backed SQL validator.
pub struct SemanticValidator {
    llm: Arc<dyn LlmClient>,
}

impl SemanticValidator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Asks the completion service to judge `sql` against `schema`.
    pub async fn validate(&self, sql: &str, schema: &str) -> ValidationVerdict {
        let prompt = build_validation_prompt(sql, schema);

        let verdict = match self.llm.complete_prompt(&prompt).await {
            Ok(response) => parse_verdict(&response),
            Err(e) => {
                warn!("Error during query validation: {}", e);
                ValidationVerdict::invalid(format!("validation error: {}", e))
            }
        };

        debug!(
            is_valid = verdict.is_valid,
            reason = %verdict.reason,
            "Validation verdict"
        );
        verdict
    }
}
