//! In-process [`Store`] backing the test suites and the in-process test server.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Query, Row, Store, StoreError};
use crate::filter::{FilterWhereInfo, SortDirection};

/// Primitive operations a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Upsert,
    Insert,
    Delete,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Row>>,
    failures: HashMap<(StoreOp, String), String>,
}

/// Keeps the sequential default composites, so partial-failure windows are
/// observable here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    latency: Option<Duration>,
    selects: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `select` sleeps for `latency` before reading.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency: Some(latency), ..Self::default() }
    }

    /// Makes every `op` on `table` fail with `message` until cleared.
    pub fn fail_on(&self, op: StoreOp, table: &str, message: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failures.insert((op, table.to_string()), message.to_string());
        }
    }

    pub fn clear_failure(&self, op: StoreOp, table: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failures.remove(&(op, table.to_string()));
        }
    }

    /// Snapshot of a table in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .read()
            .map(|state| state.tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn select_calls(&self) -> usize {
        self.selects.load(AtomicOrdering::SeqCst)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

fn check_failure(state: &MemoryState, op: StoreOp, table: &str) -> Result<(), StoreError> {
    match state.failures.get(&(op, table.to_string())) {
        Some(message) => Err(StoreError::Backend(message.clone())),
        None => Ok(()),
    }
}

fn matches(row: &Row, predicates: &[FilterWhereInfo]) -> bool {
    predicates
        .iter()
        .all(|p| row.get(&p.column).unwrap_or(&Value::Null) == &p.data)
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Fills the columns Postgres would default.
fn with_defaults(mut row: Row) -> Row {
    row.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));
    row
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: Query) -> Result<Vec<Row>, StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.selects.fetch_add(1, AtomicOrdering::SeqCst);
        query.to_filter()?;

        let state = self.read()?;
        check_failure(&state, StoreOp::Select, &query.table)?;
        let mut rows: Vec<Row> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| matches(r, &query.predicates)).cloned().collect())
            .unwrap_or_default();
        drop(state);

        // Stable sort, applied last key first, keeps insertion order on ties.
        for info in query.order.iter().rev() {
            rows.sort_by(|a, b| {
                let ordering = compare(
                    a.get(&info.column).unwrap_or(&Value::Null),
                    b.get(&info.column).unwrap_or(&Value::Null),
                );
                match info.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(0));
        }
        if !query.columns.is_empty() {
            rows = rows
                .into_iter()
                .map(|row| {
                    query
                        .columns
                        .iter()
                        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                        .collect()
                })
                .collect();
        }
        Ok(rows)
    }

    async fn upsert(&self, table: &str, row: Row, conflict_key: &str) -> Result<(), StoreError> {
        let key = row
            .get(conflict_key)
            .cloned()
            .ok_or_else(|| StoreError::InvalidPayload(format!("upsert into {} is missing {}", table, conflict_key)))?;
        let mut state = self.write()?;
        check_failure(&state, StoreOp::Upsert, table)?;
        let rows = state.tables.entry(table.to_string()).or_default();
        match rows.iter_mut().find(|r| r.get(conflict_key) == Some(&key)) {
            Some(existing) => existing.extend(row),
            None => rows.push(with_defaults(row)),
        }
        Ok(())
    }

    async fn insert_many(&self, table: &str, rows: Vec<Row>) -> Result<(), StoreError> {
        let mut state = self.write()?;
        check_failure(&state, StoreOp::Insert, table)?;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows.into_iter().map(with_defaults));
        Ok(())
    }

    async fn delete(&self, query: Query) -> Result<u64, StoreError> {
        query.to_filter()?.to_delete_sql()?;
        let mut state = self.write()?;
        check_failure(&state, StoreOp::Delete, &query.table)?;
        let Some(rows) = state.tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches(r, &query.predicates));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_key() {
        let store = MemoryStore::new();
        store.upsert("student_details", row(json!({"user_id": "u1", "given_name": "Ana"})), "user_id").await.unwrap();
        store.upsert("student_details", row(json!({"user_id": "u1", "family_name": "Lee"})), "user_id").await.unwrap();

        let rows = store.rows("student_details");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["given_name"], json!("Ana"));
        assert_eq!(rows[0]["family_name"], json!("Lee"));
        assert!(rows[0].contains_key("id"));
    }

    #[tokio::test]
    async fn select_filters_orders_and_projects() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "users",
                vec![
                    row(json!({"id": "2", "full_name": "Zed", "admin_id": "a"})),
                    row(json!({"id": "1", "full_name": "Amy", "admin_id": "a"})),
                    row(json!({"id": "3", "full_name": "Bob", "admin_id": "b"})),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select(Query::table("users").columns(&["full_name"]).eq("admin_id", "a").order_by("full_name", SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(rows, vec![row(json!({"full_name": "Amy"})), row(json!({"full_name": "Zed"}))]);
    }

    #[tokio::test]
    async fn maybe_one_rejects_duplicates() {
        let store = MemoryStore::new();
        store
            .insert_many("admin", vec![row(json!({"id": "x"})), row(json!({"id": "x"}))])
            .await
            .unwrap();
        let err = store.select_maybe_one(Query::table("admin").eq("id", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::MultipleRows { count: 2, .. }));
        assert!(store.select_maybe_one(Query::table("admin").eq("id", "y")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_surfaces_message() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::Delete, "coe_history", "permission denied for table coe_history");
        let err = store.delete(Query::table("coe_history").eq("user_id", "u")).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table coe_history");

        store.clear_failure(StoreOp::Delete, "coe_history");
        assert_eq!(store.delete(Query::table("coe_history").eq("user_id", "u")).await.unwrap(), 0);
    }
}
