//! Mock LLM client for testing.
//!
//! Provides deterministic responses: pattern rules first, then a queue of
//! scripted responses, then built-in defaults for the office schema. Every
//! prompt is recorded so tests can inspect what the model was shown.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{AskError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Marker present in every validation prompt.
const VALIDATOR_MARKER: &str = "sql query validator";

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing and `--llm mock` without making real API calls.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response), checked in order.
    custom_responses: Vec<(String, String)>,
    /// Generation responses handed out one per call once no pattern matched.
    sequence: Mutex<VecDeque<String>>,
    /// Validation responses handed out one per validation prompt.
    validation_sequence: Mutex<VecDeque<String>>,
    /// Prompts received, in call order.
    prompts: Mutex<Vec<String>>,
    /// When set, every call fails with this message.
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern` (case-insensitive), the mock returns `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Answers every validation prompt with `response`.
    pub fn with_validation_response(self, response: impl Into<String>) -> Self {
        self.with_response(VALIDATOR_MARKER, response)
    }

    /// Queues responses returned in order, one per call.
    pub fn with_sequence<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sequence
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Queues validation responses returned in order, one per validation prompt.
    pub fn with_validation_sequence<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_sequence
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Makes every call fail with an LLM error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains(VALIDATOR_MARKER) {
            return Self::pop(&self.validation_sequence).unwrap_or_else(|| {
                r#"{"is_valid": true, "reason": "Query is valid", "suggested_fix": ""}"#
                    .to_string()
            });
        }

        if let Some(next) = Self::pop(&self.sequence) {
            return next;
        }

        // Defaults look at the request itself, not the schema or hints around it.
        let request = input_lower.rsplit("request:").next().unwrap_or(&input_lower);

        if request.contains("salary") {
            return "```sql\nSELECT e.name, p.salary\nFROM Employees e\nJOIN Payroll p ON e.employee_id = p.employee_id\nORDER BY p.pay_date DESC;\n```".to_string();
        }

        if request.contains("employee") {
            return "```sql\nSELECT employee_id, name FROM Employees;\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    fn pop(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }

    /// Flattens the request into the text the mock matches against.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(input.clone());

        if let Some(message) = &self.failure {
            return Err(AskError::llm(message.clone()));
        }

        Ok(self.mock_response(&input))
    }
}
