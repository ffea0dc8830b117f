use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::models::{Order, OrderDetails};
use crate::database::Repository;
use crate::filter::{Condition, FilterOp, FilterWhereInfo, SortWhitelist};
use crate::types::{Page, PageRequest};

use super::{validate_price, CertificateService, ServiceError, UserService};

pub const ORDER_SORT: SortWhitelist = &[("id", "id"), ("price", "price"), ("createDate", "created_date")];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: i64,
    pub certificate_id: i64,
}

/// Reference to another resource by id, e.g. `{"user": {"id": 3}}`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub id: i64,
    pub price: Option<Decimal>,
    pub user: Option<IdRef>,
    pub certificate: Option<IdRef>,
}

pub struct OrderService {
    pool: PgPool,
}

impl OrderService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<Order> {
        Repository::new("cert_order", self.pool.clone())
    }

    fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    fn certificates(&self) -> CertificateService {
        CertificateService::new(self.pool.clone())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<OrderDetails, ServiceError> {
        debug!("Looking for an order with id {}", id);
        let order = self
            .repository()
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found_id(id))?;
        info!("Found an order with id {}", id);
        self.single_details(order).await
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<OrderDetails>, ServiceError> {
        debug!("Retrieving orders. Page request: {:?}", request);
        let (orders, total) = self.repository().select_page(request.to_filter_data(ORDER_SORT)?).await?;
        let content = self.details(orders).await?;
        info!("Retrieved {} orders of {} total", content.len(), total);
        Ok(Page::new(content, request, total))
    }

    /// Price is captured from the certificate at the time of ordering
    pub async fn create(&self, request: NewOrder) -> Result<OrderDetails, ServiceError> {
        debug!("Creating order of certificate {} for user {}", request.certificate_id, request.user_id);

        let user = self.users().find_by_id(request.user_id).await?;
        let certificate = self.certificates().find_by_id(request.certificate_id).await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO cert_order (price, customer_id, cert_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(certificate.certificate.price)
        .bind(user.user.id)
        .bind(certificate.certificate.id)
        .fetch_one(&self.pool)
        .await?;

        info!("Order created with id {}", order.id);
        Ok(OrderDetails { order, user, certificate })
    }

    pub async fn update(&self, patch: OrderPatch) -> Result<OrderDetails, ServiceError> {
        debug!("Updating order with id {}", patch.id);
        validate_price(patch.price)?;
        if let Some(user) = patch.user {
            if !self.users().exists(user.id).await? {
                return Err(ServiceError::not_found_id(user.id));
            }
        }
        if let Some(certificate) = patch.certificate {
            if !self.certificates().exists(certificate.id).await? {
                return Err(ServiceError::not_found_id(certificate.id));
            }
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE cert_order SET
                price = COALESCE($2, price),
                customer_id = COALESCE($3, customer_id),
                cert_id = COALESCE($4, cert_id),
                last_update_date = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(patch.id)
        .bind(patch.price)
        .bind(patch.user.map(|u| u.id))
        .bind(patch.certificate.map(|c| c.id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found_id(patch.id))?;

        info!("Order with id {} updated", order.id);
        self.single_details(order).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        debug!("Deleting order with id {}", id);
        let result = sqlx::query("DELETE FROM cert_order WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found_id(id));
        }
        info!("Order with id {} is deleted", id);
        Ok(())
    }

    /// The order only if it belongs to the user
    pub async fn find_by_user(&self, order_id: i64, user_id: i64) -> Result<OrderDetails, ServiceError> {
        debug!("Looking for order {} of user {}", order_id, user_id);
        let order = sqlx::query_as::<_, Order>("SELECT * FROM cert_order WHERE id = $1 AND customer_id = $2")
            .bind(order_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("id = {}, userId = {}", order_id, user_id)))?;
        self.single_details(order).await
    }

    pub async fn find_all_by_user(&self, user_id: i64, request: &PageRequest) -> Result<Page<OrderDetails>, ServiceError> {
        debug!("Retrieving orders of user {}. Page request: {:?}", user_id, request);
        if !self.users().exists(user_id).await? {
            return Err(ServiceError::not_found_id(user_id));
        }

        let mut filter_data = request.to_filter_data(ORDER_SORT)?;
        filter_data.conditions.push(Condition::Field(FilterWhereInfo::new(
            "customer_id",
            FilterOp::Eq,
            user_id,
        )));
        let (orders, total) = self.repository().select_page(filter_data).await?;
        let content = self.details(orders).await?;

        info!("Retrieved {} orders of user {}", content.len(), user_id);
        Ok(Page::new(content, request, total))
    }

    /// Price of the user's most expensive order, zero without orders
    pub async fn highest_cost(&self, user_id: i64) -> Result<Decimal, ServiceError> {
        debug!("Looking for an order with highest cost by user id {}", user_id);
        let cost: Option<Decimal> = sqlx::query_scalar("SELECT MAX(price) FROM cert_order WHERE customer_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if cost.is_none() {
            info!("No orders by user's id {} found", user_id);
        }
        Ok(cost.unwrap_or(Decimal::ZERO))
    }

    async fn single_details(&self, order: Order) -> Result<OrderDetails, ServiceError> {
        let id = order.id;
        self.details(vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found_id(id))
    }

    async fn details(&self, orders: Vec<Order>) -> Result<Vec<OrderDetails>, ServiceError> {
        let user_ids: Vec<i64> = orders.iter().map(|o| o.customer_id).collect();
        let certificate_ids: Vec<i64> = orders.iter().map(|o| o.cert_id).collect();

        let users = self.users().find_many(&user_ids).await?;
        let certificates = self.certificates().find_many(&certificate_ids).await?;

        orders
            .into_iter()
            .map(|order| {
                let user = users
                    .get(&order.customer_id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found_id(order.customer_id))?;
                let certificate = certificates
                    .get(&order.cert_id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found_id(order.cert_id))?;
                Ok(OrderDetails { order, user, certificate })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_order_reads_camel_case() {
        let order: NewOrder = serde_json::from_value(json!({"userId": 2, "certificateId": 9})).unwrap();
        assert_eq!((order.user_id, order.certificate_id), (2, 9));
    }

    #[test]
    fn patch_takes_nested_references() {
        let patch: OrderPatch =
            serde_json::from_value(json!({"id": 1, "user": {"id": 3}, "certificate": {"id": 4, "name": "x"}})).unwrap();
        assert_eq!(patch.user.map(|u| u.id), Some(3));
        assert_eq!(patch.certificate.map(|c| c.id), Some(4));
        assert!(patch.price.is_none());
    }
}
