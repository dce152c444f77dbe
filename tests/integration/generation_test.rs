//! Generation-repair loop tests.
//!
//! The mock database plays the role of the live oracle: scripted patterns
//! reject specific candidates with real-looking driver diagnostics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use askdb::db::{DatabaseClient, MockDatabaseClient, QueryResult};
use askdb::error::{AskError, Result};
use askdb::generation::{AttemptOutcome, SqlGenerator};
use askdb::llm::MockLlmClient;
use async_trait::async_trait;
use pretty_assertions::assert_eq;

use super::common::{generator, office_schema, UNKNOWN_SALARY_ERROR};

#[tokio::test]
async fn test_salary_request_repaired_with_payroll_join() {
    let llm = Arc::new(MockLlmClient::new().with_sequence([
        "```sql\nSELECT name, salary FROM Employees;\n```",
        "```sql\nSELECT e.name, p.salary FROM Employees e JOIN Payroll p ON e.employee_id = p.employee_id;\n```",
    ]));
    let db = Arc::new(
        MockDatabaseClient::new().with_error("SELECT name, salary FROM Employees", UNKNOWN_SALARY_ERROR),
    );

    let generation = generator(&llm, &db)
        .generate("show me the salary of every employee")
        .await
        .unwrap();

    assert!(generation.sql.contains("JOIN Payroll"));
    assert_eq!(generation.attempts.len(), 2);
    assert_eq!(
        generation.attempts[0].outcome,
        AttemptOutcome::Failure {
            error_detail: "salary".to_string(),
            raw_error: UNKNOWN_SALARY_ERROR.to_string(),
        }
    );
    assert!(generation.attempts[1].is_success());
    assert_eq!(db.execution_count(), 2);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Employee salaries are stored in the Payroll table"));
    assert!(prompts[1].contains("SELECT name, salary FROM Employees;"));
    assert!(prompts[1].contains(UNKNOWN_SALARY_ERROR));
    assert!(prompts[1].contains("The specific issue was related to: salary"));
}

#[tokio::test]
async fn test_each_corrective_prompt_carries_previous_attempt() {
    let llm = Arc::new(MockLlmClient::new().with_sequence([
        "SELECT first_try",
        "SELECT second_try",
        "SELECT third_try",
    ]));
    let db = Arc::new(
        MockDatabaseClient::new()
            .with_error("first_try", "Unknown column 'first_try' in 'field list'")
            .with_error("second_try", "Table 'OfficeDB.second_try' doesn't exist")
            .with_error("third_try", "Column 'third_try' in field list is ambiguous"),
    );

    let err = generator(&llm, &db)
        .with_max_attempts(3)
        .generate("anything")
        .await
        .unwrap_err();

    match err {
        AskError::GenerationExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "Column 'third_try' in field list is ambiguous");
        }
        other => panic!("expected GenerationExhausted, got {:?}", other),
    }

    assert_eq!(db.execution_count(), 3);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[0].contains("previous SQL query failed"));
    assert!(prompts[1].contains("SELECT first_try"));
    assert!(prompts[1].contains("Unknown column 'first_try' in 'field list'"));
    assert!(prompts[2].contains("SELECT second_try"));
    assert!(prompts[2].contains("Table 'OfficeDB.second_try' doesn't exist"));
    assert!(prompts[2].contains("The specific issue was related to: OfficeDB.second_try"));
}

#[tokio::test]
async fn test_exhaustion_message_carries_attempts_and_last_error() {
    let llm = Arc::new(MockLlmClient::new().with_sequence(vec!["SELECT broken"; 5]));
    let db = Arc::new(MockDatabaseClient::new().with_error("broken", "syntax error at end of input"));

    let err = generator(&llm, &db).generate("r").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to generate valid SQL after 5 attempts. Last error: syntax error at end of input"
    );
    assert_eq!(db.execution_count(), 5);
}

/// Executor whose connection is gone.
struct DisconnectedDatabase {
    calls: AtomicUsize,
}

#[async_trait]
impl DatabaseClient for DisconnectedDatabase {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AskError::connection("Cannot connect to localhost:3306."))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_connection_loss_is_not_fed_back_to_the_model() {
    let llm = Arc::new(MockLlmClient::new().with_sequence(["SELECT 1", "SELECT 2"]));
    let db = Arc::new(DisconnectedDatabase {
        calls: AtomicUsize::new(0),
    });

    let err = SqlGenerator::new(llm.clone(), db.clone(), office_schema())
        .generate("r")
        .await
        .unwrap_err();

    assert!(matches!(err, AskError::Connection(_)));
    assert_eq!(db.calls.load(Ordering::SeqCst), 1);
    assert_eq!(llm.call_count(), 1);
}
