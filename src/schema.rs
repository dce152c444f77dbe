//! Schema provider.
//!
//! Loads the plain-text schema description (typically a DDL dump) that
//! grounds every generation and validation prompt. The text is passed
//! verbatim; nothing here parses it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Placeholder substituted when no schema source is available.
pub const SCHEMA_UNAVAILABLE: &str = "Schema not available.";

/// Default schema file, relative to the working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "officedb.sql";

/// Source of the schema text used as prompt context.
///
/// Implementations never fail: a missing source yields [`SCHEMA_UNAVAILABLE`].
pub trait SchemaProvider: Send + Sync {
    /// Loads the schema text. Called freshly for each prompt.
    fn load_schema(&self) -> String;
}

/// Reads the schema from a file on every call.
#[derive(Debug, Clone)]
pub struct FileSchemaProvider {
    path: PathBuf,
}

impl FileSchemaProvider {
    /// Creates a provider for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the configured path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSchemaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_PATH)
    }
}

impl SchemaProvider for FileSchemaProvider {
    fn load_schema(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                debug!(
                    "Loaded schema from {} ({} bytes)",
                    self.path.display(),
                    text.len()
                );
                text
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Schema file {} not found", self.path.display());
                SCHEMA_UNAVAILABLE.to_string()
            }
            Err(e) => {
                warn!("Could not read schema file {}: {e}", self.path.display());
                SCHEMA_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Serves a fixed, in-memory schema text.
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    text: String,
}

impl StaticSchemaProvider {
    /// Creates a provider that always returns `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn load_schema(&self) -> String {
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_provider_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CREATE TABLE Employees (employee_id INT, name VARCHAR(100));").unwrap();

        let provider = FileSchemaProvider::new(file.path());
        let schema = provider.load_schema();

        assert!(schema.contains("CREATE TABLE Employees"));
    }

    #[test]
    fn test_file_provider_rereads_each_call() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CREATE TABLE a (id INT);").unwrap();
        let provider = FileSchemaProvider::new(file.path());
        assert_eq!(provider.load_schema(), "CREATE TABLE a (id INT);");

        write!(file, "\nCREATE TABLE b (id INT);").unwrap();
        assert!(provider.load_schema().contains("CREATE TABLE b"));
    }

    #[test]
    fn test_missing_file_returns_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSchemaProvider::new(dir.path().join("missing.sql"));

        assert_eq!(provider.load_schema(), SCHEMA_UNAVAILABLE);
    }

    #[test]
    fn test_directory_path_returns_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSchemaProvider::new(dir.path());

        assert_eq!(provider.load_schema(), SCHEMA_UNAVAILABLE);
    }

    #[test]
    fn test_default_path() {
        let provider = FileSchemaProvider::default();
        assert_eq!(provider.path(), Path::new(DEFAULT_SCHEMA_PATH));
    }

    #[test]
    fn test_static_provider() {
        let provider = StaticSchemaProvider::new("Employees(employee_id, name)");
        assert_eq!(provider.load_schema(), "Employees(employee_id, name)");
    }
}
