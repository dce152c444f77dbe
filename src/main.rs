//! askdb - natural-language questions answered with SQL.

use std::sync::Arc;

use askdb::cli::Cli;
use askdb::config::{Config, ConnectionConfig};
use askdb::db::{self, DatabaseBackend, DatabaseClient, MockDatabaseClient};
use askdb::error::{AskError, Result};
use askdb::generation::SqlGenerator;
use askdb::llm::{create_client, LlmProvider};
use askdb::logging::init_stderr_logging;
use askdb::output::format_outcome;
use askdb::pipeline::QueryPipeline;
use askdb::schema::{FileSchemaProvider, SchemaProvider, StaticSchemaProvider};
use askdb::validation::SemanticValidator;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("Error: {}", e.client_reason());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.output_format()?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    // CLI flags override the config file.
    if let Some(model) = &cli.model {
        config.llm.model = Some(model.clone());
    }
    let provider: LlmProvider = cli
        .llm
        .as_deref()
        .unwrap_or(&config.llm.provider)
        .parse()
        .map_err(AskError::config)?;
    let max_attempts = cli
        .max_attempts
        .unwrap_or(config.generation.max_attempts);

    let llm = create_client(provider, &config.llm, None)?;

    let db: Arc<dyn DatabaseClient> = if cli.mock_db {
        info!("Using mock database");
        Arc::new(MockDatabaseClient::new())
    } else {
        let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
            AskError::config(
                "No database connection configured. Use --url, -c <name> or set PG*/MYSQL_* variables.",
            )
        })?;
        info!("Connecting to {}", connection.display_string());
        db::connect(&connection).await?
    };

    let schema: Arc<dyn SchemaProvider> = match &cli.schema_text {
        Some(text) => Arc::new(StaticSchemaProvider::new(text.clone())),
        None => Arc::new(FileSchemaProvider::new(
            cli.schema
                .clone()
                .unwrap_or_else(|| config.generation.schema_path.clone()),
        )),
    };

    let generator = SqlGenerator::new(llm.clone(), db.clone(), schema.clone())
        .with_max_attempts(max_attempts)
        .with_domain_hints(config.generation.domain_hints.clone());
    let pipeline = QueryPipeline::new(generator, SemanticValidator::new(llm), schema, db.clone());

    let outcome = pipeline.run(&cli.request).await;

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    }

    let outcome = outcome?;
    println!("{}", format_outcome(&outcome, format).trim_end());

    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(AskError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
        return Ok(connection);
    }

    // Environment only: the first backend whose variables name a database.
    Ok([DatabaseBackend::Postgres, DatabaseBackend::MySql]
        .into_iter()
        .map(|backend| {
            let mut conn = ConnectionConfig {
                backend,
                ..Default::default()
            };
            conn.apply_env_defaults();
            conn
        })
        .find(|conn| conn.database.is_some()))
}
