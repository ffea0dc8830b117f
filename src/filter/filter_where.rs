use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, FilterOp, FilterWhereInfo, Relation};
use super::filter::validate_identifier;

/// Renders conditions into a WHERE clause with `$n` placeholders
pub struct FilterWhere<'a> {
    table_name: &'a str,
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(table_name: &'a str, starting_param_index: usize) -> Self {
        Self {
            table_name,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Returns an empty string when there is nothing to restrict
    pub fn generate(
        table_name: &str,
        conditions: &[Condition],
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(table_name, starting_param_index);
        filter_where.build(conditions)
    }

    fn build(&mut self, conditions: &[Condition]) -> Result<(String, Vec<Value>), FilterError> {
        let mut sql_conditions = vec![];
        for condition in conditions {
            sql_conditions.push(self.build_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), std::mem::take(&mut self.param_values)))
    }

    fn build_condition(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::Field(info) => self.build_sql_condition(&format!("\"{}\"", info.column), info),
            Condition::Any(infos) => {
                if infos.is_empty() {
                    return Ok("1=0".to_string());
                }
                let mut parts = vec![];
                for info in infos {
                    parts.push(self.build_sql_condition(&format!("\"{}\"", info.column), info)?);
                }
                Ok(format!("({})", parts.join(" OR ")))
            }
            Condition::Related { relation, info } => self.build_related(relation, info),
        }
    }

    fn build_related(&mut self, relation: &Relation, info: &FilterWhereInfo) -> Result<String, FilterError> {
        for ident in [relation.link_table, relation.owner_column, relation.target_column, relation.target_table] {
            validate_identifier(ident).map_err(FilterError::InvalidColumn)?;
        }
        let predicate = self.build_sql_condition(&format!("r.\"{}\"", info.column), info)?;
        Ok(format!(
            "EXISTS (SELECT 1 FROM \"{link}\" l JOIN \"{target}\" r ON r.\"id\" = l.\"{target_col}\" WHERE l.\"{owner_col}\" = \"{table}\".\"id\" AND {predicate})",
            link = relation.link_table,
            target = relation.target_table,
            target_col = relation.target_column,
            owner_col = relation.owner_column,
            table = self.table_name,
            predicate = predicate,
        ))
    }

    fn build_sql_condition(&mut self, column: &str, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        validate_identifier(&condition.column).map_err(FilterError::InvalidColumn)?;

        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { Ok(format!("{} IS NULL", column)) }
                else { Ok(format!("{} = {}", column, self.param(condition.data.clone())?)) }
            }
            FilterOp::Like => Ok(format!("{} LIKE {}", column, self.param(condition.data.clone())?)),
            FilterOp::In => match &condition.data {
                Value::Array(values) => {
                    if values.is_empty() { return Ok("1=0".to_string()); }
                    let mut params = vec![];
                    for v in values {
                        params.push(self.param(v.clone())?);
                    }
                    Ok(format!("{} IN ({})", column, params.join(", ")))
                }
                other => Ok(format!("{} = {}", column, self.param(other.clone())?)),
            },
        }
    }

    fn param(&mut self, value: Value) -> Result<String, FilterError> {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return Err(FilterError::InvalidOperatorData(format!("cannot bind {} as a scalar", value)));
        }
        self.param_values.push(value);
        self.param_index += 1;
        Ok(format!("${}", self.param_index))
    }
}
