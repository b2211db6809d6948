use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query as SqlxQuery;
use sqlx::{PgPool, Postgres, Row as _};
use tracing::{debug, info};
use uuid::Uuid;

use super::{PurgeError, Query, Row, Store, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::{Filter, SqlResult};

/// PostgreSQL store. The composite operations run in one transaction each.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool, log_queries: config.enable_query_logging })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, log_queries: false }
    }

    fn trace(&self, sql: &SqlResult) {
        if self.log_queries {
            debug!(query = %sql.query, params = sql.params.len(), "sql");
        }
    }
}

// Predicate values arrive as JSON. Every predicate column in this schema is a
// uuid, so uuid-shaped strings bind as uuid to keep index lookups typed.
fn bind_param<'q>(query: SqlxQuery<'q, Postgres, PgArguments>, value: &Value) -> SqlxQuery<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => query.bind(i),
            (None, Some(f)) => query.bind(f),
            (None, None) => query.bind(n.to_string()),
        },
        Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) => query.bind(id),
            Err(_) => query.bind(s.clone()),
        },
        Value::Array(_) | Value::Object(_) => query.bind(sqlx::types::Json(value.clone())),
    }
}

fn bind_params<'q>(mut query: SqlxQuery<'q, Postgres, PgArguments>, params: &[Value]) -> SqlxQuery<'q, Postgres, PgArguments> {
    for param in params {
        query = bind_param(query, param);
    }
    query
}

async fn execute<'c, E>(executor: E, sql: &SqlResult) -> Result<u64, StoreError>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    let result = bind_params(sqlx::query(&sql.query), &sql.params)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

fn decode_row(row: &PgRow) -> Result<Row, StoreError> {
    let value: Value = row.try_get("row")?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidPayload(format!("expected an object row, got {}", other))),
    }
}

fn row_columns(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn insert_sql(table: &str, rows: Vec<Row>) -> Result<SqlResult, StoreError> {
    let columns = row_columns(&rows);
    let payload = rows.into_iter().map(Value::Object).collect();
    Ok(Filter::new(table)?.to_insert_sql(&columns, payload)?)
}

fn delete_sql(table: &str, column: &str, value: &Value) -> Result<SqlResult, StoreError> {
    Ok(Query::table(table).eq(column, value.clone()).to_filter()?.to_delete_sql()?)
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        let sql = query.to_filter()?.to_sql()?;
        self.trace(&sql);
        let rows = bind_params(sqlx::query(&sql.query), &sql.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn upsert(&self, table: &str, row: Row, conflict_key: &str) -> Result<(), StoreError> {
        let columns = row_columns(std::slice::from_ref(&row));
        let sql = Filter::new(table)?.to_upsert_sql(&columns, conflict_key, Value::Object(row))?;
        self.trace(&sql);
        execute(&self.pool, &sql).await.map(|_| ())
    }

    async fn insert_many(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let sql = insert_sql(table, rows)?;
        self.trace(&sql);
        execute(&self.pool, &sql).await.map(|_| ())
    }

    async fn delete(&self, query: Query) -> Result<u64, StoreError> {
        let sql = query.to_filter()?.to_delete_sql()?;
        self.trace(&sql);
        execute(&self.pool, &sql).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn replace_owned(&self, table: &str, owner_column: &str, owner: Value, rows: Vec<Row>) -> Result<(), StoreError> {
        let delete = delete_sql(table, owner_column, &owner)?;
        let insert = if rows.is_empty() { None } else { Some(insert_sql(table, rows)?) };

        let mut tx = self.pool.begin().await?;
        execute(&mut *tx, &delete).await?;
        if let Some(insert) = insert {
            execute(&mut *tx, &insert).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn purge_owner(
        &self,
        tables: &[&str],
        owner_column: &str,
        owner: Value,
        identity_table: &str,
        identity_column: &str,
    ) -> Result<(), PurgeError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PurgeError::Identity(e.into()))?;

        for table in tables {
            let owned = |source: StoreError| PurgeError::Owned { table: table.to_string(), source };
            let sql = delete_sql(table, owner_column, &owner).map_err(owned)?;
            execute(&mut *tx, &sql).await.map_err(owned)?;
        }

        let sql = delete_sql(identity_table, identity_column, &owner).map_err(PurgeError::Identity)?;
        execute(&mut *tx, &sql).await.map_err(PurgeError::Identity)?;
        tx.commit().await.map_err(|e| PurgeError::Identity(e.into()))?;
        Ok(())
    }
}
