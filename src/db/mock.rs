//! Mock database client for testing.
//!
//! Scripted, in-memory executor: statements matching a registered pattern
//! fail with a canned diagnostic or return canned rows, and every executed
//! statement is recorded so tests can count round-trips.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted response for statements containing a pattern.
#[derive(Debug, Clone)]
enum Scripted {
    Error(String),
    Rows(QueryResult),
}

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    /// Pattern -> response, checked in insertion order.
    scripted: Vec<(String, Scripted)>,
    /// Every statement passed to `execute_query`, in order.
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client that accepts every statement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails statements containing `pattern` (case-insensitive) with `message`.
    pub fn with_error(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.scripted
            .push((pattern.into(), Scripted::Error(message.into())));
        self
    }

    /// Returns `result` for statements containing `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.scripted.push((pattern.into(), Scripted::Rows(result)));
        self
    }

    /// Returns every statement executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the number of statements executed so far.
    pub fn execution_count(&self) -> usize {
        self.executed.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn default_result(sql: &str) -> QueryResult {
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let columns = vec![ColumnInfo::new("result", "TEXT")];
            let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];
            QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1))
        } else {
            QueryResult::new().with_execution_time(Duration::from_millis(1))
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sql.to_string());

        let sql_lower = sql.to_lowercase();
        for (pattern, response) in &self.scripted {
            if sql_lower.contains(&pattern.to_lowercase()) {
                return match response {
                    Scripted::Error(message) => Err(AskError::query(message.clone())),
                    Scripted::Rows(result) => Ok(result.clone()),
                };
            }
        }

        Ok(Self::default_result(sql))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
