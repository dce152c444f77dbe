//! End-to-end pipeline tests with mock collaborators.

use std::sync::Arc;

use askdb::db::MockDatabaseClient;
use askdb::error::AskError;
use askdb::llm::MockLlmClient;
use askdb::safety::SafetyViolation;
use askdb::validation::PARSE_FAILURE_REASON;
use pretty_assertions::assert_eq;

use super::common::pipeline;

#[tokio::test]
async fn test_salary_request_end_to_end() {
    let llm = Arc::new(MockLlmClient::new());
    let db = Arc::new(MockDatabaseClient::new());

    let outcome = pipeline(&llm, &db)
        .run("show me the salary of every employee")
        .await
        .unwrap();

    assert!(outcome.sql.contains("JOIN Payroll p ON e.employee_id = p.employee_id"));
    assert!(!outcome.auto_fixed);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.result.row_count, 1);
    // Generation, then validation.
    assert_eq!(llm.call_count(), 2);
    assert_eq!(db.executed(), vec![outcome.sql.clone(), outcome.sql.clone()]);
}

#[tokio::test]
async fn test_validator_fix_replaces_candidate() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_sequence(["SELECT name FROM Employees"])
            .with_validation_sequence([
                r#"{"is_valid": false, "reason": "missing alias", "suggested_fix": "SELECT e.name FROM Employees e"}"#,
                r#"{"is_valid": true, "reason": "ok", "suggested_fix": ""}"#,
            ]),
    );
    let db = Arc::new(MockDatabaseClient::new());

    let outcome = pipeline(&llm, &db).run("list employee names").await.unwrap();

    assert_eq!(outcome.sql, "SELECT e.name FROM Employees e");
    assert!(outcome.auto_fixed);
    assert_eq!(
        db.executed().last().map(String::as_str),
        Some("SELECT e.name FROM Employees e")
    );
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn test_rejected_fix_surfaces_first_reason() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_sequence(["SELECT name FROM Employees"])
            .with_validation_sequence([
                r#"{"is_valid": false, "reason": "first reason", "suggested_fix": "SELECT nonsense"}"#,
                r#"{"is_valid": false, "reason": "second reason", "suggested_fix": "SELECT more nonsense"}"#,
            ]),
    );
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("list employee names").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid query: first reason");
    // No third validation and no final execution.
    assert_eq!(llm.call_count(), 3);
    assert_eq!(db.execution_count(), 1);
}

#[tokio::test]
async fn test_invalid_without_fix_is_rejected_immediately() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_sequence(["SELECT name FROM Employees"])
            .with_validation_response(r#"{"is_valid": false, "reason": "not what was asked"}"#),
    );
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("list employee names").await.unwrap_err();

    assert!(matches!(err, AskError::ValidationRejected(ref reason) if reason == "not what was asked"));
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_malformed_verdict_rejects_without_panicking() {
    let llm = Arc::new(
        MockLlmClient::new()
            .with_sequence(["SELECT name FROM Employees"])
            .with_validation_response("Looks good to me!"),
    );
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("list employee names").await.unwrap_err();

    assert_eq!(
        err.client_reason(),
        format!("Invalid query: {}", PARSE_FAILURE_REASON)
    );
}

#[tokio::test]
async fn test_denylisted_statement_never_reaches_final_execution() {
    let llm = Arc::new(MockLlmClient::new().with_sequence(["DROP TABLE Employees"]));
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("clean up").await.unwrap_err();

    match &err {
        AskError::SafetyRejected(SafetyViolation::DenylistedKeyword(keyword)) => {
            assert_eq!(keyword, "DROP")
        }
        other => panic!("expected SafetyRejected, got {:?}", other),
    }
    assert_eq!(
        err.client_reason(),
        "Unsafe SQL detected (denylisted keyword DROP). Query rejected."
    );
    // Only the loop's own execution happened.
    assert_eq!(db.execution_count(), 1);
}

#[tokio::test]
async fn test_stacked_statements_rejected() {
    let llm = Arc::new(MockLlmClient::new().with_sequence(["SELECT 1; SELECT 2;"]));
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("two things").await.unwrap_err();

    assert!(matches!(
        err,
        AskError::SafetyRejected(SafetyViolation::MultipleStatements(2))
    ));
}

#[tokio::test]
async fn test_completion_service_down() {
    let llm = Arc::new(MockLlmClient::new().failing("Failed to connect to Ollama"));
    let db = Arc::new(MockDatabaseClient::new());

    let err = pipeline(&llm, &db).run("anything").await.unwrap_err();

    assert_eq!(err.category(), "LLM Error");
    assert_eq!(db.execution_count(), 0);
}
