use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, FilterWhereInfo, SortDirection, SqlResult};

/// SQL builder for one table.
///
/// Reads come back as one `jsonb` column named `row`, and writes take their
/// payload as a single `jsonb` parameter expanded with
/// `jsonb_populate_record(set)`, so column types are resolved by Postgres
/// against the table definition rather than by parameter binding.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: vec![],
            order_data: vec![],
            limit: None,
        })
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            Self::validate_column(column)?;
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: Value) -> Result<&mut Self, FilterError> {
        let column = column.into();
        Self::validate_column(&column)?;
        self.where_data.push(FilterWhereInfo { column, data: value });
        Ok(self)
    }

    pub fn where_all(&mut self, conditions: Vec<FilterWhereInfo>) -> Result<&mut Self, FilterError> {
        for condition in conditions {
            self.where_eq(condition.column, condition.data)?;
        }
        Ok(self)
    }

    pub fn order(&mut self, column: impl Into<String>, sort: SortDirection) -> Result<&mut Self, FilterError> {
        let column = column.into();
        Self::validate_column(&column)?;
        self.order_data.push(FilterOrderInfo { column, sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.where_data, 0)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default();

        let query = [
            format!("SELECT {} AS row", self.build_select_clause()),
            format!("FROM \"{}\" AS r", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params })
    }

    /// Refuses to build an unconditional delete.
    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.where_data, 0)?;
        if where_clause.is_empty() {
            return Err(FilterError::InvalidWhereClause("DELETE requires at least one predicate".to_string()));
        }
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" WHERE {}", self.table_name, where_clause),
            params,
        })
    }

    pub fn to_insert_sql(&self, columns: &[String], rows: Vec<Value>) -> Result<SqlResult, FilterError> {
        let column_list = self.build_column_list(columns)?;
        let query = format!(
            "INSERT INTO \"{table}\" ({cols}) SELECT {cols} FROM jsonb_populate_recordset(NULL::\"{table}\", $1)",
            table = self.table_name,
            cols = column_list,
        );
        Ok(SqlResult { query, params: vec![Value::Array(rows)] })
    }

    pub fn to_upsert_sql(&self, columns: &[String], conflict_key: &str, row: Value) -> Result<SqlResult, FilterError> {
        Self::validate_column(conflict_key)?;
        if !row.is_object() {
            return Err(FilterError::InvalidPayload("upsert payload must be an object".to_string()));
        }
        let column_list = self.build_column_list(columns)?;
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| c.as_str() != conflict_key)
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect();
        let action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };
        let query = format!(
            "INSERT INTO \"{table}\" ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::\"{table}\", $1) ON CONFLICT (\"{key}\") {action}",
            table = self.table_name,
            cols = column_list,
            key = conflict_key,
        );
        Ok(SqlResult { query, params: vec![row] })
    }

    pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
        if column.is_empty() { return Err(FilterError::InvalidColumn("Column name cannot be empty".to_string())); }
        if !Self::is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() { return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string())); }
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() {
            "to_jsonb(r)".to_string()
        } else {
            let pairs: Vec<String> = self
                .select_columns
                .iter()
                .map(|c| format!("'{c}', r.\"{c}\""))
                .collect();
            format!("jsonb_build_object({})", pairs.join(", "))
        }
    }

    fn build_column_list(&self, columns: &[String]) -> Result<String, FilterError> {
        if columns.is_empty() {
            return Err(FilterError::InvalidPayload(format!("no columns to write into {}", self.table_name)));
        }
        for column in columns {
            Self::validate_column(column)?;
        }
        Ok(columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", "))
    }
}
