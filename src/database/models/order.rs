use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::certificate::CertificateWithTags;
use super::user::UserWithRoles;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub price: Option<Decimal>,
    pub customer_id: i64,
    pub cert_id: i64,
    pub created_date: DateTime<Utc>,
    pub last_update_date: DateTime<Utc>,
}

/// Order with its user and certificate loaded
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub user: UserWithRoles,
    pub certificate: CertificateWithTags,
}
