//! Integration tests for askdb.
//!
//! Tests in `query_test` require a running PostgreSQL or MySQL database.
//! Set DATABASE_URL environment variable to run them.

pub mod common;
pub mod generation_test;
pub mod pipeline_test;
pub mod query_test;
