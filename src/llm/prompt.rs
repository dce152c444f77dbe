//! Prompt construction for LLM requests.
//!
//! Three prompts drive a request: the initial generation prompt, the
//! corrective prompt fed back after a database error, and the validation
//! prompt asking for a JSON verdict.

use std::fmt::Write;

/// Generation prompt template.
const GENERATION_PROMPT_TEMPLATE: &str = r#"You are a SQL expert and act as an SQL Assistant.

Understand the given database schema carefully:
{schema}

Important Schema Relationships:
{hints}

Translate the following natural language request into a valid and accurate SQL query, using the correct tables and column references.

- Do not guess column locations; use only columns that exist in the appropriate tables
- Use JOINs if data comes from multiple tables
- Do not use GROUP BY unless aggregation (e.g., SUM, COUNT, AVG) is required
- Show identifying information (e.g., names) when relevant
- Return ONLY the SQL query, no explanations

Request: "{request}"

SQL:
"#;

/// Correction prompt template.
const CORRECTION_PROMPT_TEMPLATE: &str = r#"You are a SQL expert and act as an SQL Assistant. The previous SQL query failed with this error:
{error}

The specific issue was related to: {error_detail}

The incorrect SQL was:
{previous_sql}

IMPORTANT - Database Schema and Relationships:
{schema}

Important Schema Relationships:
{hints}

Please fix the SQL query following these rules:
1. Review the schema to identify which table contains each column
2. Add necessary JOINs to access columns from different tables
3. Use proper table aliases and reference columns from their correct tables
4. Ensure all column references exist in their respective tables
5. Return ONLY the corrected SQL query, no explanations

Original request: "{request}"

SQL:
"#;

/// Validation prompt template.
const VALIDATION_PROMPT_TEMPLATE: &str = r#"You are a SQL query validator. Your task is to validate if the given SQL query is:
1. Syntactically correct
2. Safe to execute (no dangerous operations)
3. Compatible with the database schema

Database Schema:
{schema}

SQL Query to validate:
{sql}

Respond with a JSON object in this format:
{
    "is_valid": true/false,
    "reason": "explanation of validation result",
    "suggested_fix": "suggested fix if invalid, empty string if valid"
}

IMPORTANT: Your response must be a valid JSON object. Do not include any additional text or explanation outside the JSON."#;

/// Renders domain hints as a bullet list.
fn format_hints(hints: &[String]) -> String {
    if hints.is_empty() {
        return "- (none)".to_string();
    }

    let mut output = String::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let _ = write!(output, "- {}", hint);
    }
    output
}

/// Fills `{name}` placeholders in one pass over the template.
///
/// Substituted values are never re-scanned, so SQL or error text containing
/// braces comes through unchanged.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let tail = &rest[start..];

        let placeholder = values.iter().find_map(|(name, value)| {
            tail.strip_prefix('{')
                .and_then(|t| t.strip_prefix(name))
                .and_then(|t| t.strip_prefix('}'))
                .map(|after| (value, after))
        });

        match placeholder {
            Some((value, after)) => {
                output.push_str(value);
                rest = after;
            }
            None => {
                output.push('{');
                rest = &tail[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Builds the prompt for the first generation attempt.
pub fn build_generation_prompt(schema: &str, hints: &[String], request: &str) -> String {
    let hints = format_hints(hints);
    render(
        GENERATION_PROMPT_TEMPLATE,
        &[("schema", schema), ("hints", &hints), ("request", request)],
    )
}

/// Builds the prompt for a corrective attempt.
///
/// The previous SQL and the raw database error are embedded verbatim.
pub fn build_correction_prompt(
    schema: &str,
    hints: &[String],
    request: &str,
    previous_sql: &str,
    raw_error: &str,
    error_detail: &str,
) -> String {
    let hints = format_hints(hints);
    render(
        CORRECTION_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("hints", &hints),
            ("request", request),
            ("error_detail", error_detail),
            ("previous_sql", previous_sql),
            ("error", raw_error),
        ],
    )
}

/// Builds the prompt asking for a JSON validation verdict.
pub fn build_validation_prompt(sql: &str, schema: &str) -> String {
    render(VALIDATION_PROMPT_TEMPLATE, &[("schema", schema), ("sql", sql)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_domain_hints;

    const SCHEMA: &str = "CREATE TABLE Employees (employee_id INT, name VARCHAR(100));";

    #[test]
    fn test_generation_prompt_contains_schema_hints_and_request() {
        let prompt = build_generation_prompt(SCHEMA, &default_domain_hints(), "list everyone");

        assert!(prompt.contains(SCHEMA));
        assert!(prompt.contains("- Employee salaries are stored in the Payroll table"));
        assert!(prompt.contains("Request: \"list everyone\""));
        assert!(prompt.trim_end().ends_with("SQL:"));
    }

    #[test]
    fn test_generation_prompt_without_hints() {
        let prompt = build_generation_prompt(SCHEMA, &[], "count rows");
        assert!(prompt.contains("- (none)"));
    }

    #[test]
    fn test_correction_prompt_embeds_previous_attempt_verbatim() {
        let previous = "SELECT salary FROM Employees";
        let error = "1054 (42S22): Unknown column 'salary' in 'field list'";
        let prompt = build_correction_prompt(SCHEMA, &[], "salaries", previous, error, "salary");

        assert!(prompt.contains(previous));
        assert!(prompt.contains(error));
        assert!(prompt.contains("The specific issue was related to: salary"));
        assert!(prompt.contains("Original request: \"salaries\""));
    }

    #[test]
    fn test_correction_prompt_does_not_expand_placeholders_in_sql() {
        let previous = "SELECT '{error}' AS literal";
        let prompt = build_correction_prompt(SCHEMA, &[], "r", previous, "boom", "boom");
        assert!(prompt.contains(previous));
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        let rendered = render("{\n  \"a\": {x}\n}", &[("x", "1")]);
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_validation_prompt() {
        let prompt = build_validation_prompt("SELECT 1", SCHEMA);

        assert!(prompt.starts_with("You are a SQL query validator"));
        assert!(prompt.contains("SQL Query to validate:\nSELECT 1"));
        assert!(prompt.contains("\"suggested_fix\""));
    }
}
