//! Output formatting for query outcomes.
//!
//! Provides two formats: a plain-text table and JSON.

use crate::db::QueryResult;
use crate::pipeline::QueryOutcome;

/// Output format for results printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Executed SQL followed by an aligned text table.
    #[default]
    Text,
    /// Pretty-printed JSON with the SQL, attempt count and rows.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Formats a query outcome according to `format`.
pub fn format_outcome(outcome: &QueryOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text(outcome),
        OutputFormat::Json => format_json(outcome),
    }
}

fn format_text(outcome: &QueryOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!("SQL: {}\n", outcome.sql));
    if outcome.auto_fixed {
        output.push_str("(using the validator's suggested fix)\n");
    }
    output.push('\n');
    output.push_str(&format_table(&outcome.result));

    output
}

fn format_json(outcome: &QueryOutcome) -> String {
    serde_json::to_string_pretty(&outcome.report())
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

/// Renders a result set as an aligned text table with a row-count footer.
pub fn format_table(result: &QueryResult) -> String {
    let footer = format!(
        "({} {}, {}ms)\n",
        result.row_count,
        if result.row_count == 1 { "row" } else { "rows" },
        result.execution_time.as_millis()
    );

    if result.columns.is_empty() {
        return footer;
    }

    let headers: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = render_line(headers.iter().copied(), &widths);
    output.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    output.push('\n');

    for row in &cells {
        output.push_str(&render_line(row.iter().map(String::as_str), &widths));
    }

    output.push_str(&footer);
    if let Some(warning) = result.truncation_warning() {
        output.push_str(&format!("{}\n", warning));
    }

    output
}

fn render_line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = values
        .zip(widths)
        .map(|(value, width)| format!("{:<width$}", value, width = *width))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n", line.trim_end())
}
