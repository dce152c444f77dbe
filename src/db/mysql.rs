//! MySQL and MariaDB executor.
//!
//! MySQL diagnostics (`Unknown column 'x' in 'field list'`) are passed
//! through verbatim so the repair loop can point the model at the culprit.

use crate::config::ConnectionConfig;
use crate::db::{collect_rows, open_pool, DatabaseClient, QueryResult, Row, Value};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{Column as _, Decode, MySql, Row as _, Type, TypeInfo as _};

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        Ok(Self {
            pool: open_pool(config).await?,
        })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        collect_rows(sqlx::query(sql).fetch_all(&self.pool), convert_row).await
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    (0..row.len())
        .map(|i| cell(row, i).unwrap_or(Value::Null))
        .collect()
}

fn cell(row: &MySqlRow, i: usize) -> Option<Value> {
    let type_name = row.column(i).type_info().name();

    if type_name.ends_with("UNSIGNED") && type_name.contains("INT") {
        return get::<u64>(row, i)
            .and_then(|v| i64::try_from(v).ok())
            .map(Value::Int);
    }

    match type_name {
        "BOOLEAN" => get::<bool>(row, i).map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get::<i64>(row, i).map(Value::Int)
        }
        "FLOAT" => get::<f32>(row, i).map(|v| Value::Float(v.into())),
        "DOUBLE" => get::<f64>(row, i).map(Value::Float),
        // DECIMAL travels as text in the binary protocol.
        "DECIMAL" => row
            .try_get_unchecked::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
            get::<Vec<u8>>(row, i).map(Value::Bytes)
        }
        _ => get::<String>(row, i).map(Value::String),
    }
}

fn get<'r, T>(row: &'r MySqlRow, i: usize) -> Option<T>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get::<Option<T>, _>(i).ok().flatten()
}
