//! PostgreSQL executor.

use crate::config::ConnectionConfig;
use crate::db::{collect_rows, open_pool, DatabaseClient, QueryResult, Row, Value};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column as _, Decode, Postgres, Row as _, Type, TypeInfo as _};

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        Ok(Self {
            pool: open_pool(config).await?,
        })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        collect_rows(sqlx::query(sql).fetch_all(&self.pool), convert_row).await
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn convert_row(row: &PgRow) -> Row {
    (0..row.len())
        .map(|i| cell(row, i).unwrap_or(Value::Null))
        .collect()
}

/// Decodes column `i`, choosing the Rust type from the Postgres type name.
///
/// `NUMERIC`, dates and everything else without a dedicated arm come back as text.
fn cell(row: &PgRow, i: usize) -> Option<Value> {
    match row.column(i).type_info().name() {
        "BOOL" => get::<bool>(row, i).map(Value::Bool),
        "INT2" => get::<i16>(row, i).map(|v| Value::Int(v.into())),
        "INT4" => get::<i32>(row, i).map(|v| Value::Int(v.into())),
        "INT8" => get::<i64>(row, i).map(Value::Int),
        "FLOAT4" => get::<f32>(row, i).map(|v| Value::Float(v.into())),
        "FLOAT8" => get::<f64>(row, i).map(Value::Float),
        "BYTEA" => get::<Vec<u8>>(row, i).map(Value::Bytes),
        _ => get::<String>(row, i).map(Value::String),
    }
}

fn get<'r, T>(row: &'r PgRow, i: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(i).ok().flatten()
}
