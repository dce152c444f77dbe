//! Request orchestration.
//!
//! Runs one natural-language request end to end: generate executable SQL,
//! validate it (with at most one fix escalation), apply the static safety
//! filter, then execute the final statement and hand back its rows.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{AskError, Result};
use crate::generation::{GenerationAttempt, SqlGenerator};
use crate::safety::{check_sql, SafetyDecision};
use crate::schema::SchemaProvider;
use crate::validation::{SemanticValidator, ValidationVerdict};

/// Everything a successful request produced.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The statement that was finally executed.
    pub sql: String,
    pub result: QueryResult,
    /// Generation history, oldest first.
    pub attempts: Vec<GenerationAttempt>,
    /// True when the validator's suggested fix replaced the generated SQL.
    pub auto_fixed: bool,
}

/// Serializable summary used by the JSON output format.
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub sql: &'a str,
    pub attempts: usize,
    pub auto_fixed: bool,
    pub result: &'a QueryResult,
}

impl QueryOutcome {
    pub fn report(&self) -> OutcomeReport<'_> {
        OutcomeReport {
            sql: &self.sql,
            attempts: self.attempts.len(),
            auto_fixed: self.auto_fixed,
            result: &self.result,
        }
    }
}

/// Applies the fix-escalation policy to a first verdict.
///
/// Returns the SQL to continue with and whether it is the validator's fix.
/// An invalid verdict with a fix gets exactly one re-validation; the first
/// verdict's reason is reported when that also fails.
pub async fn apply_validation_gate(
    validator: &SemanticValidator,
    sql: &str,
    schema: &str,
    first: ValidationVerdict,
) -> Result<(String, bool)> {
    if first.is_valid {
        return Ok((sql.to_string(), false));
    }

    let Some(fix) = first.fix() else {
        warn!("Query rejected by validator: {}", first.reason);
        return Err(AskError::validation_rejected(first.reason));
    };

    info!("Attempting suggested fix: {}", fix);
    let second = validator.validate(fix, schema).await;
    if second.is_valid {
        info!("Suggested fix passed validation");
        return Ok((fix.to_string(), true));
    }

    warn!(
        "Suggested fix rejected ({}); reporting original reason: {}",
        second.reason, first.reason
    );
    Err(AskError::validation_rejected(first.reason))
}

/// End-to-end natural-language query pipeline.
pub struct QueryPipeline {
    generator: SqlGenerator,
    validator: SemanticValidator,
    schema: Arc<dyn SchemaProvider>,
    db: Arc<dyn DatabaseClient>,
}

impl QueryPipeline {
    pub fn new(
        generator: SqlGenerator,
        validator: SemanticValidator,
        schema: Arc<dyn SchemaProvider>,
        db: Arc<dyn DatabaseClient>,
    ) -> Self {
        Self {
            generator,
            validator,
            schema,
            db,
        }
    }

    /// Answers `request` with the rows of a generated, validated and safe query.
    pub async fn run(&self, request: &str) -> Result<QueryOutcome> {
        let request = request.trim();
        if request.is_empty() {
            return Err(AskError::invalid_request("request is empty"));
        }

        info!("Processing request: {}", request);

        let generation = self.generator.generate(request).await.map_err(|e| {
            error!("Generation failed: {}", e);
            e
        })?;

        let schema = self.schema.load_schema();
        let verdict = self.validator.validate(&generation.sql, &schema).await;
        let (sql, auto_fixed) =
            apply_validation_gate(&self.validator, &generation.sql, &schema, verdict).await?;

        if let SafetyDecision::Rejected(violation) = check_sql(&sql) {
            error!("Unsafe SQL rejected ({}): {}", violation, sql);
            return Err(AskError::SafetyRejected(violation));
        }

        let result = self.db.execute_query(&sql).await.map_err(|e| {
            error!("Final execution failed: {}", e);
            e
        })?;

        info!(
            rows = result.row_count,
            auto_fixed, "Request answered"
        );

        Ok(QueryOutcome {
            sql,
            result,
            attempts: generation.attempts,
            auto_fixed,
        })
    }
}
