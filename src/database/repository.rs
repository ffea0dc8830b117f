use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{Condition, FilterData, FilterOp, FilterWhereInfo};

/// Generic read access to one table; joins and writes live in the services
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    /// One page of rows plus the total number of matching rows
    pub async fn select_page(&self, filter_data: FilterData) -> Result<(Vec<T>, i64), DatabaseError> {
        let count_filter = FilterData {
            conditions: filter_data.conditions.clone(),
            ..Default::default()
        };
        let rows = self.select_any(filter_data).await?;
        let total = self.count(count_filter).await?;
        Ok((rows, total))
    }

    pub async fn select_by_id(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(Self::by_id(id))?
            .select_optional(&self.pool)
            .await
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.count(Self::by_id(id)).await? > 0)
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(self.table_name)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    pub async fn select_ids(&self, ids: &[i64]) -> Result<Vec<T>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filter = FilterData {
            conditions: vec![Condition::Field(FilterWhereInfo::new("id", FilterOp::In, json!(ids)))],
            ..Default::default()
        };
        self.select_any(filter).await
    }

    fn by_id(id: i64) -> FilterData {
        FilterData {
            conditions: vec![Condition::Field(FilterWhereInfo::new("id", FilterOp::Eq, json!(id)))],
            ..Default::default()
        }
    }
}
