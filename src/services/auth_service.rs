use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::auth::{generate_jwt, generate_refresh_token, verify_password, Claims};
use crate::database::models::refresh_token::digest_token;
use crate::database::models::{RefreshToken, UserWithRoles};

use super::user_service::NewUser;
use super::{ServiceError, UserService};

pub const REFRESH_TOKEN_NOT_FOUND: &str = "Refresh token is not in database!";
pub const REFRESH_TOKEN_EXPIRED: &str = "Refresh token was expired. Please make a new login request";

/// Issued on login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserWithRoles,
}

/// Issued on refresh; the refresh token is handed back unchanged
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn users(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, ServiceError> {
        debug!("Login attempt for {}", username);

        let user = match self.users().find_by_username(username).await? {
            Some(user) if verify_password(password, &user.user.password) => user,
            _ => {
                warn!("Failed login for {}", username);
                return Err(ServiceError::BadCredentials);
            }
        };

        let access_token = generate_jwt(&Claims::for_user(&user))?;
        let refresh_token = self.create_refresh_token(user.user.id).await?;

        info!("User {} logged in", user.user.id);
        Ok(LoginSession { access_token, refresh_token, user })
    }

    /// Exchange a refresh token for a new access token carrying the user's current roles
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedSession, ServiceError> {
        let stored = sqlx::query_as::<_, RefreshToken>("SELECT * FROM refreshtoken WHERE token = $1")
            .bind(digest_token(refresh_token))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::RefreshToken(REFRESH_TOKEN_NOT_FOUND.to_string()))?;

        if stored.is_expired_at(Utc::now()) {
            sqlx::query("DELETE FROM refreshtoken WHERE id = $1")
                .bind(stored.id)
                .execute(&self.pool)
                .await?;
            warn!("Expired refresh token of user {} removed", stored.customer_id);
            return Err(ServiceError::RefreshToken(REFRESH_TOKEN_EXPIRED.to_string()));
        }

        let user = self.users().find_by_id(stored.customer_id).await?;
        let access_token = generate_jwt(&Claims::for_user(&user))?;

        info!("Access token refreshed for user {}", user.user.id);
        Ok(RefreshedSession {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    pub async fn register(&self, request: NewUser) -> Result<UserWithRoles, ServiceError> {
        self.users().register(request).await
    }

    pub async fn logout(&self, user_id: i64) -> Result<(), ServiceError> {
        sqlx::query("DELETE FROM refreshtoken WHERE customer_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        info!("User {} logged out", user_id);
        Ok(())
    }

    /// One refresh token per user: a new login replaces the previous one
    async fn create_refresh_token(&self, user_id: i64) -> Result<String, ServiceError> {
        let (token, expiry_date) = generate_refresh_token(Utc::now());

        sqlx::query(
            "INSERT INTO refreshtoken (token, expiry_date, customer_id) VALUES ($1, $2, $3) \
             ON CONFLICT (customer_id) DO UPDATE SET token = EXCLUDED.token, expiry_date = EXCLUDED.expiry_date",
        )
        .bind(digest_token(&token))
        .bind(expiry_date)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }
}
