//! Shared fixtures for integration tests.

use std::sync::Arc;

use askdb::db::MockDatabaseClient;
use askdb::generation::SqlGenerator;
use askdb::llm::MockLlmClient;
use askdb::pipeline::QueryPipeline;
use askdb::schema::{SchemaProvider, StaticSchemaProvider};
use askdb::validation::SemanticValidator;

/// The office schema used throughout the tests.
pub const OFFICE_SCHEMA: &str = r#"CREATE TABLE Employees (
    employee_id INT PRIMARY KEY,
    name VARCHAR(100),
    department_id INT,
    hire_date DATE
);

CREATE TABLE Payroll (
    payroll_id INT PRIMARY KEY,
    employee_id INT,
    salary DECIMAL(10, 2),
    pay_date DATE,
    FOREIGN KEY (employee_id) REFERENCES Employees(employee_id)
);
"#;

/// MySQL's diagnostic for selecting the salary column from Employees.
pub const UNKNOWN_SALARY_ERROR: &str = "1054 (42S22): Unknown column 'salary' in 'field list'";

pub fn office_schema() -> Arc<dyn SchemaProvider> {
    Arc::new(StaticSchemaProvider::new(OFFICE_SCHEMA))
}

pub fn generator(llm: &Arc<MockLlmClient>, db: &Arc<MockDatabaseClient>) -> SqlGenerator {
    SqlGenerator::new(llm.clone(), db.clone(), office_schema())
}

pub fn pipeline(llm: &Arc<MockLlmClient>, db: &Arc<MockDatabaseClient>) -> QueryPipeline {
    QueryPipeline::new(
        generator(llm, db),
        SemanticValidator::new(llm.clone()),
        office_schema(),
        db.clone(),
    )
}
