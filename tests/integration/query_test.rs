//! Query execution integration tests.
//!
//! Run against whichever backend `DATABASE_URL` points at (postgres:// or mysql://).

use std::sync::Arc;

use askdb::config::ConnectionConfig;
use askdb::db::{self, DatabaseClient};
use askdb::error::AskError;
use askdb::generation::{extract_detail, SqlGenerator};
use askdb::llm::MockLlmClient;

use super::common::office_schema;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<Arc<dyn DatabaseClient>> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    db::connect(&config).await.ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[0].name, "num");
    assert_eq!(result.columns[1].name, "greeting");
    assert_eq!(result.row_count, 1);
    assert!(!result.was_truncated);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_unknown_column_diagnostic_is_classified() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = client
        .execute_query("SELECT no_such_column FROM (SELECT 1 AS a) t")
        .await
        .unwrap_err();

    assert!(err.is_recoverable(), "expected a query error, got {:?}", err);
    assert_eq!(extract_detail(&err.diagnostic()), "no_such_column");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = client.execute_query("SELEC 1").await.unwrap_err();
    assert!(matches!(err, AskError::Query(_)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_generation_repairs_against_live_database() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm = Arc::new(MockLlmClient::new().with_sequence([
        "SELECT no_such_column FROM (SELECT 1 AS a) t",
        "```sql\nSELECT a FROM (SELECT 1 AS a) t\n```",
    ]));

    let generation = SqlGenerator::new(llm.clone(), client.clone(), office_schema())
        .generate("the number one")
        .await
        .unwrap();

    assert_eq!(generation.sql, "SELECT a FROM (SELECT 1 AS a) t");
    assert_eq!(generation.attempts.len(), 2);
    assert!(llm.prompts()[1].contains("no_such_column"));

    client.close().await.unwrap();
}
