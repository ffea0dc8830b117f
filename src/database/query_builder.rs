use serde_json::Value;
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData, FilterError};

/// Scalar parameter produced by the filter layer, typed for binding
#[derive(Debug, Clone, PartialEq)]
enum Param<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl<'a> From<&'a Value> for Param<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Param::Int(i),
                (None, Some(f)) => Param::Float(f),
                (None, None) => Param::Null,
            },
            Value::String(s) => Param::Text(s),
            // FilterWhere expands arrays into scalar params and rejects objects
            Value::Array(_) | Value::Object(_) => Param::Null,
        }
    }
}

/// Binds every filter parameter in order; works for `query`, `query_as` and `query_scalar`
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params.iter().map(Param::from) {
            q = match param {
                Param::Null => q.bind(None::<String>),
                Param::Bool(b) => q.bind(b),
                Param::Int(i) => q.bind(i),
                Param::Float(f) => q.bind(f),
                Param::Text(s) => q.bind(s),
            };
        }
        q
    }};
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

/// Runs a `Filter` against one table and maps rows to `T`
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(table_name)?,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_sql()?;
        let rows = bind_params!(sqlx::query_as::<_, T>(&query), params)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_sql()?;
        let row = bind_params!(sqlx::query_as::<_, T>(&query), params)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// COUNT(*) over the filter's conditions, ignoring order and paging
    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_count_sql()?;
        let count = bind_params!(sqlx::query_scalar::<_, i64>(&query), params)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
