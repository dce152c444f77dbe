//! askdb - natural-language questions answered with SQL.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod safety;
pub mod schema;
pub mod validation;
