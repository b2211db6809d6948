//! Generic per-table storage.
//!
//! Rows travel as JSON objects. Section tables, `admin` and `users` all go
//! through the same four primitives; the two composite operations have
//! sequential default implementations that a backend may replace with an
//! atomic one.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;

pub use error::{PurgeError, StoreError};
pub use memory::{MemoryStore, StoreOp};
pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::filter::{Filter, FilterError, FilterOrderInfo, FilterWhereInfo, SortDirection};

pub type Row = Map<String, Value>;

pub const OWNER_COLUMN: &str = "user_id";

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub columns: Vec<String>,
    pub predicates: Vec<FilterWhereInfo>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![],
            predicates: vec![],
            order: vec![],
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(FilterWhereInfo::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, sort: SortDirection) -> Self {
        self.order.push(FilterOrderInfo { column: column.into(), sort });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_filter(&self) -> Result<Filter, FilterError> {
        let mut filter = Filter::new(self.table.clone())?;
        filter.select(self.columns.clone())?;
        filter.where_all(self.predicates.clone())?;
        for info in &self.order {
            filter.order(info.column.clone(), info.sort)?;
        }
        if let Some(limit) = self.limit {
            filter.limit(limit)?;
        }
        Ok(filter)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError>;

    async fn upsert(&self, table: &str, row: Row, conflict_key: &str) -> Result<(), StoreError>;

    async fn insert_many(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Deletes every row matching the query's predicates. Returns the count.
    async fn delete(&self, query: Query) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// At most one row: `None` when nothing matches, an error when more than
    /// one row does.
    async fn select_maybe_one(&self, query: Query) -> Result<Option<Row>, StoreError> {
        let table = query.table.clone();
        let mut rows = self.select(query.limit(2)).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(StoreError::MultipleRows { table, count }),
        }
    }

    /// Replaces every row owned by `owner` with `rows`.
    ///
    /// Default: delete, then insert. A failed delete stops before the insert;
    /// a failed insert leaves the owner with no rows in `table`.
    async fn replace_owned(&self, table: &str, owner_column: &str, owner: Value, rows: Vec<Row>) -> Result<(), StoreError> {
        self.delete(Query::table(table).eq(owner_column, owner)).await?;
        if rows.is_empty() {
            return Ok(());
        }
        self.insert_many(table, rows).await
    }

    /// Deletes `owner`'s rows from each of `tables` in order, then the
    /// identity row `identity_table.identity_column = owner` last.
    ///
    /// Default: sequential, stopping at the first failure. Tables already
    /// cleared stay cleared.
    async fn purge_owner(
        &self,
        tables: &[&str],
        owner_column: &str,
        owner: Value,
        identity_table: &str,
        identity_column: &str,
    ) -> Result<(), PurgeError> {
        for table in tables {
            self.delete(Query::table(*table).eq(owner_column, owner.clone()))
                .await
                .map_err(|source| PurgeError::Owned { table: table.to_string(), source })?;
        }
        self.delete(Query::table(identity_table).eq(identity_column, owner))
            .await
            .map_err(PurgeError::Identity)?;
        Ok(())
    }
}
