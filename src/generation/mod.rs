//! Generation-repair loop.
//!
//! Asks the completion service for SQL, executes the candidate against the
//! live database and, when the database rejects it, feeds the previous SQL
//! and the raw error back in a corrective prompt. Live execution is the
//! oracle: the loop ends at the first candidate that runs.

pub mod error_detail;

pub use error_detail::{classify_error, extract_detail, ErrorDetail, ErrorShape};

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{default_domain_hints, DEFAULT_MAX_ATTEMPTS};
use crate::db::DatabaseClient;
use crate::error::{AskError, Result};
use crate::llm::prompt::{build_correction_prompt, build_generation_prompt};
use crate::llm::{sanitize_sql, LlmClient};
use crate::schema::SchemaProvider;

/// Raw error recorded when a completion sanitizes down to nothing.
pub const EMPTY_COMPLETION_ERROR: &str = "completion returned no SQL";

/// How a single attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure {
        /// Offending identifier, or the raw error when unrecognized.
        error_detail: String,
        /// Database diagnostic exactly as reported.
        raw_error: String,
    },
}

/// One generate/execute round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// Zero-based attempt index.
    pub attempt_index: u32,
    /// Sanitized SQL produced for this attempt.
    pub candidate_sql: String,
    pub outcome: AttemptOutcome,
}

impl GenerationAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success)
    }
}

/// SQL that executed successfully, plus the history that led to it.
#[derive(Debug, Clone)]
pub struct Generation {
    pub sql: String,
    pub attempts: Vec<GenerationAttempt>,
}

/// Bounded generate/execute/repair loop.
pub struct SqlGenerator {
    llm: Arc<dyn LlmClient>,
    db: Arc<dyn DatabaseClient>,
    schema: Arc<dyn SchemaProvider>,
    max_attempts: u32,
    domain_hints: Vec<String>,
}

impl SqlGenerator {
    /// Creates a generator with the default attempt budget and domain hints.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        db: Arc<dyn DatabaseClient>,
        schema: Arc<dyn SchemaProvider>,
    ) -> Self {
        Self {
            llm,
            db,
            schema,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            domain_hints: default_domain_hints(),
        }
    }

    /// Sets the attempt budget. Values below 1 are clamped to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replaces the domain hints injected into every prompt.
    pub fn with_domain_hints(mut self, hints: Vec<String>) -> Self {
        self.domain_hints = hints;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Produces SQL for `request` that the database accepts.
    ///
    /// Database errors are retried with a corrective prompt until the budget
    /// is spent, ending in `GenerationExhausted`. Completion-service and
    /// connection failures propagate immediately.
    ///
    /// A completion that sanitizes to nothing spends an attempt without
    /// touching the database, so an exhausted loop executes at most
    /// `max_attempts` statements, exactly that many only when every
    /// completion was non-empty.
    pub async fn generate(&self, request: &str) -> Result<Generation> {
        let schema = self.schema.load_schema();
        let mut attempts: Vec<GenerationAttempt> = Vec::new();
        // (previous SQL, raw error) of the last failed attempt.
        let mut last_failure: Option<(String, String)> = None;

        for attempt_index in 0..self.max_attempts {
            info!(
                "Generation attempt {} of {}",
                attempt_index + 1,
                self.max_attempts
            );

            let prompt = match &last_failure {
                None => build_generation_prompt(&schema, &self.domain_hints, request),
                Some((previous_sql, raw_error)) => {
                    let detail = extract_detail(raw_error);
                    debug!(error_detail = %detail, "Building corrective prompt");
                    build_correction_prompt(
                        &schema,
                        &self.domain_hints,
                        request,
                        previous_sql,
                        raw_error,
                        &detail,
                    )
                }
            };

            let completion = self.llm.complete_prompt(&prompt).await.map_err(|e| {
                error!("Completion failed on attempt {}: {}", attempt_index + 1, e);
                e
            })?;
            let candidate = sanitize_sql(&completion);
            info!(attempt = attempt_index + 1, sql = %candidate, "Generated SQL");

            if candidate.is_empty() {
                warn!("Attempt {} produced no SQL", attempt_index + 1);
                attempts.push(Self::failed(attempt_index, &candidate, EMPTY_COMPLETION_ERROR));
                last_failure = Some((candidate, EMPTY_COMPLETION_ERROR.to_string()));
                continue;
            }

            match self.db.execute_query(&candidate).await {
                Ok(result) => {
                    info!(
                        "Attempt {} executed successfully ({} rows)",
                        attempt_index + 1,
                        result.row_count
                    );
                    attempts.push(GenerationAttempt {
                        attempt_index,
                        candidate_sql: candidate.clone(),
                        outcome: AttemptOutcome::Success,
                    });
                    return Ok(Generation {
                        sql: candidate,
                        attempts,
                    });
                }
                Err(e) if e.is_recoverable() => {
                    let raw_error = e.diagnostic();
                    warn!(
                        attempt = attempt_index + 1,
                        error = %raw_error,
                        "Query failed"
                    );
                    attempts.push(Self::failed(attempt_index, &candidate, &raw_error));
                    last_failure = Some((candidate, raw_error));
                }
                Err(e) => {
                    error!("Execution failed on attempt {}: {}", attempt_index + 1, e);
                    return Err(e);
                }
            }
        }

        let last_error = last_failure
            .map(|(_, raw_error)| raw_error)
            .unwrap_or_default();
        error!(
            "Failed to generate valid SQL after {} attempts. Last error: {}",
            self.max_attempts, last_error
        );

        Err(AskError::GenerationExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn failed(attempt_index: u32, candidate: &str, raw_error: &str) -> GenerationAttempt {
        GenerationAttempt {
            attempt_index,
            candidate_sql: candidate.to_string(),
            outcome: AttemptOutcome::Failure {
                error_detail: extract_detail(raw_error),
                raw_error: raw_error.to_string(),
            },
        }
    }
}
