//! Rows returned by the executor.

use serde::{Serialize, Serializer};
use std::time::Duration;

/// Columns and rows of an executed statement, capped at the row limit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
    #[serde(serialize_with = "as_millis")]
    pub execution_time: Duration,
    /// Rows kept in `rows`.
    pub row_count: usize,
    /// Rows the statement produced before the cap.
    pub total_rows: usize,
    pub was_truncated: bool,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untruncated result.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let total_rows = rows.len();
        Self::capped(columns, rows, total_rows)
    }

    /// Creates a result holding the first `rows` of `total_rows`.
    pub fn capped(columns: Vec<ColumnInfo>, rows: Vec<Row>, total_rows: usize) -> Self {
        Self {
            columns,
            row_count: rows.len(),
            was_truncated: total_rows > rows.len(),
            rows,
            execution_time: Duration::ZERO,
            total_rows,
        }
    }

    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Warning line shown under a truncated table.
    pub fn truncation_warning(&self) -> Option<String> {
        self.was_truncated.then(|| {
            format!(
                "Result truncated: showing {} of {} rows",
                self.row_count, self.total_rows
            )
        })
    }
}

/// Name and driver-reported type of a result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

pub type Row = Vec<Value>;

/// A single cell. Decimals and temporal types arrive as `String`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Text shown in a table cell.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(2.5).to_display_string(), "2.5");
        assert_eq!(Value::String("5200.00".into()).to_display_string(), "5200.00");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_result_serializes_rows_untagged_and_millis() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("name", "VARCHAR")],
            vec![vec![Value::String("Alice".into())], vec![Value::Null]],
        )
        .with_execution_time(Duration::from_millis(12));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rows"], serde_json::json!([["Alice"], [null]]));
        assert_eq!(json["execution_time"], 12);
        assert_eq!(json["was_truncated"], false);
    }

    #[test]
    fn test_capped_result_warns() {
        let result = QueryResult::capped(vec![], vec![vec![Value::Int(1)]], 2500);

        assert!(result.was_truncated);
        assert_eq!(result.row_count, 1);
        assert_eq!(
            result.truncation_warning().as_deref(),
            Some("Result truncated: showing 1 of 2500 rows")
        );
        assert!(QueryResult::with_data(vec![], vec![]).truncation_warning().is_none());
    }
}
