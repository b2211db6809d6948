use serde_json::Value;

use super::error::FilterError;
use super::filter::Filter;
use super::types::FilterWhereInfo;

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Compiles equality predicates into an `AND`-joined clause with `$n`
    /// placeholders. An empty predicate list yields an empty clause.
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in conditions {
            Filter::validate_column(&condition.column)?;
            sql_conditions.push(filter_where.build_sql_condition(condition));
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let quoted_column = format!("\"{}\"", condition.column);
        if condition.data.is_null() {
            format!("{} IS NULL", quoted_column)
        } else {
            format!("{} = {}", quoted_column, self.param(condition.data.clone()))
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_predicates_with_numbered_params() {
        let conditions = vec![
            FilterWhereInfo::eq("admin_id", json!("a")),
            FilterWhereInfo::eq("id", json!("b")),
        ];
        let (clause, params) = FilterWhere::generate(&conditions, 0).unwrap();
        assert_eq!(clause, "\"admin_id\" = $1 AND \"id\" = $2");
        assert_eq!(params, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn null_compiles_to_is_null_without_param() {
        let (clause, params) = FilterWhere::generate(&[FilterWhereInfo::eq("admin_id", Value::Null)], 3).unwrap();
        assert_eq!(clause, "\"admin_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_injected_column() {
        let err = FilterWhere::generate(&[FilterWhereInfo::eq("id\" OR 1=1 --", json!(1))], 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }
}
