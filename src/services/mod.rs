pub mod auth_service;
pub mod certificate_service;
pub mod order_service;
pub mod role_service;
pub mod seed_service;
pub mod tag_service;
pub mod user_service;

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::database::manager::DatabaseError;
use crate::filter::FilterError;

pub use auth_service::AuthService;
pub use certificate_service::CertificateService;
pub use order_service::OrderService;
pub use role_service::RoleService;
pub use seed_service::SeedService;
pub use tag_service::TagService;
pub use user_service::UserService;

/// Unique user attribute already held by another account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakenField {
    Username,
    Email,
}

impl fmt::Display for TakenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TakenField::Username => write!(f, "Username is already taken!"),
            TakenField::Email => write!(f, "Email is already in use!"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Carries the lookup key, e.g. `id = 5`
    #[error("Requested resource not found ({0})")]
    NotFound(String),

    #[error("Role {0} cannot be assigned on registration.")]
    RoleNotAssignable(String),

    #[error("Error: {0}")]
    AlreadyTaken(TakenField),

    #[error("{0}")]
    Conflict(String),

    #[error("User cannot be deleted - has found in ({0}) orders")]
    UserCannotDelete(i64),

    #[error("{0}")]
    RefreshToken(String),

    #[error("Bad credentials")]
    BadCredentials,

    #[error("{field}: {problem}")]
    Validation { field: String, problem: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(err))
    }
}

impl ServiceError {
    pub fn not_found_id(id: i64) -> Self {
        ServiceError::NotFound(format!("id = {}", id))
    }

    pub fn validation(field: impl Into<String>, problem: impl Into<String>) -> Self {
        ServiceError::Validation { field: field.into(), problem: problem.into() }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, ServiceError::Database(e) if e.is_unique_violation())
    }
}

/// Prices are stored as NUMERIC(12, 2): non-negative and below 10^10 once rounded to cents
pub(crate) fn validate_price(price: Option<Decimal>) -> Result<(), ServiceError> {
    let Some(price) = price else {
        return Ok(());
    };
    if price.is_sign_negative() {
        return Err(ServiceError::validation("price", "must not be negative"));
    }
    let cents = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if cents >= Decimal::from(10_000_000_000_i64) {
        return Err(ServiceError::validation("price", "must be less than 10000000000"));
    }
    Ok(())
}

/// Reject blank required strings
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        Err(ServiceError::validation(field, "must not be blank"))
    } else {
        Ok(())
    }
}
