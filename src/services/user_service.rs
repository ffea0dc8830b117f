use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::auth::hash_password;
use crate::database::models::role::{normalize_role_name, UserRoleRow, ROLE_ADMIN, ROLE_USER};
use crate::database::models::{Role, User, UserWithRoles};
use crate::database::Repository;
use crate::filter::SortWhitelist;
use crate::types::{Page, PageRequest};

use super::{require_text, ServiceError, TakenField};

const USERNAME_KEY: &str = "customer_username_key";
const EMAIL_KEY: &str = "customer_email_key";

pub const USER_SORT: SortWhitelist = &[
    ("id", "id"),
    ("name", "name"),
    ("username", "username"),
    ("email", "email"),
    ("createDate", "created_date"),
];

/// Registration / admin creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub username: String,
    pub password: String,
    /// Requested roles; anything but "admin" resolves to ROLE_USER
    pub role: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Role granted on registration. Self-registration can never grant admin.
pub fn registration_role(requested: Option<&[String]>) -> Result<&'static str, ServiceError> {
    let requested = requested.unwrap_or_default();
    if requested.iter().any(|r| r.trim().eq_ignore_ascii_case("admin")) {
        return Err(ServiceError::RoleNotAssignable("ADMIN".to_string()));
    }
    Ok(ROLE_USER)
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<User> {
        Repository::new("customer", self.pool.clone())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<UserWithRoles, ServiceError> {
        debug!("Looking for a user with id {}", id);
        let user = self
            .repository()
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found_id(id))?;
        info!("Found a user with id {}", id);
        self.with_roles(user).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserWithRoles>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM customer WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        match user {
            Some(user) => Ok(Some(self.with_roles(user).await?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.repository().exists(id).await?)
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<UserWithRoles>, ServiceError> {
        debug!("Retrieving users. Page request: {:?}", request);
        let (users, total) = self.repository().select_page(request.to_filter_data(USER_SORT)?).await?;
        let content = self.attach_roles(users).await?;
        info!("Retrieved {} users of {} total", content.len(), total);
        Ok(Page::new(content, request, total))
    }

    /// Users keyed by id, with their roles
    pub async fn find_many(&self, ids: &[i64]) -> Result<HashMap<i64, UserWithRoles>, ServiceError> {
        let users = self.repository().select_ids(ids).await?;
        Ok(self
            .attach_roles(users)
            .await?
            .into_iter()
            .map(|u| (u.user.id, u))
            .collect())
    }

    /// Self-registration. Duplicates report which field is taken.
    pub async fn register(&self, request: NewUser) -> Result<UserWithRoles, ServiceError> {
        debug!("Registering user {}", request.username);
        let role = registration_role(request.role.as_deref())?;
        let user = self.insert_account(request, &[role.to_string()]).await?;
        info!("User {} registered with id {}", user.user.username, user.user.id);
        Ok(user)
    }

    /// Admin creation: same rules as registration, duplicates are conflicts
    pub async fn create(&self, request: NewUser) -> Result<UserWithRoles, ServiceError> {
        self.register(request).await.map_err(taken_as_conflict)
    }

    /// Administrator account with ROLE_ADMIN and ROLE_USER, written in one transaction
    pub async fn create_admin(&self, request: NewUser) -> Result<UserWithRoles, ServiceError> {
        debug!("Creating administrator {}", request.username);
        let roles = [ROLE_ADMIN.to_string(), ROLE_USER.to_string()];
        let user = self.insert_account(request, &roles).await.map_err(taken_as_conflict)?;
        info!("Administrator {} created with id {}", user.user.username, user.user.id);
        Ok(user)
    }

    async fn insert_account(&self, request: NewUser, roles: &[String]) -> Result<UserWithRoles, ServiceError> {
        require_text("username", &request.username)?;
        require_text("email", &request.email)?;
        require_text("password", &request.password)?;
        if !request.email.contains('@') {
            return Err(ServiceError::validation("email", "must be a well-formed email address"));
        }

        let mut tx = self.pool.begin().await?;

        let username_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer WHERE username = $1)")
            .bind(request.username.trim())
            .fetch_one(&mut *tx)
            .await?;
        if username_taken {
            return Err(ServiceError::AlreadyTaken(TakenField::Username));
        }

        let email_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer WHERE email = $1)")
            .bind(request.email.trim())
            .fetch_one(&mut *tx)
            .await?;
        if email_taken {
            return Err(ServiceError::AlreadyTaken(TakenField::Email));
        }

        let password_hash = hash_password(&request.password)?;
        let user = Self::insert(&mut tx, request.name.as_deref(), &request.email, &request.username, &password_hash).await?;
        let roles = Self::set_roles(&mut tx, user.id, roles).await?;

        tx.commit().await?;
        Ok(UserWithRoles { user, roles })
    }

    pub async fn update(&self, patch: UserPatch) -> Result<UserWithRoles, ServiceError> {
        debug!("Updating user with id {}", patch.id);
        for (field, value) in [("email", &patch.email), ("username", &patch.username), ("password", &patch.password)] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }

        let password_hash = patch.password.as_deref().map(hash_password).transpose()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE customer SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                username = COALESCE($4, username),
                password = COALESCE($5, password),
                last_update_date = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(patch.id)
        .bind(&patch.name)
        .bind(patch.email.as_deref().map(str::trim))
        .bind(patch.username.as_deref().map(str::trim))
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| taken_as_conflict(duplicate_account(e)))?
        .ok_or_else(|| ServiceError::not_found_id(patch.id))?;

        info!("User with id {} updated", user.id);
        self.with_roles(user).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        debug!("Deleting user with id {}", id);

        if !self.exists(id).await? {
            return Err(ServiceError::not_found_id(id));
        }

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cert_order WHERE customer_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if orders > 0 {
            return Err(ServiceError::UserCannotDelete(orders));
        }

        sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("User with id {} is deleted", id);
        Ok(())
    }

    /// Replace the user's roles; every name must be an existing role
    pub async fn assign_roles(&self, id: i64, names: &[String]) -> Result<UserWithRoles, ServiceError> {
        debug!("Assigning roles {:?} to user {}", names, id);
        if names.iter().all(|n| n.trim().is_empty()) {
            return Err(ServiceError::validation("roles", "must contain at least one role"));
        }

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM customer WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found_id(id))?;

        let normalized: Vec<String> = names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| normalize_role_name(n))
            .collect();
        let roles = Self::set_roles(&mut tx, id, &normalized).await?;

        tx.commit().await?;

        info!("User {} now has roles {:?}", id, roles.iter().map(|r| &r.name).collect::<Vec<_>>());
        Ok(UserWithRoles { user, roles })
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        name: Option<&str>,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO customer (name, email, username, password) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(name)
        .bind(email.trim())
        .bind(username.trim())
        .bind(password_hash)
        .fetch_one(&mut *conn)
        .await
        .map_err(duplicate_account)?;
        Ok(user)
    }

    /// Replace the user's role set with the named roles
    pub(crate) async fn set_roles(
        conn: &mut PgConnection,
        user_id: i64,
        names: &[String],
    ) -> Result<Vec<Role>, ServiceError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM role WHERE name = ANY($1) ORDER BY id")
            .bind(names)
            .fetch_all(&mut *conn)
            .await?;

        if let Some(missing) = names.iter().find(|n| !roles.iter().any(|r| &r.name == *n)) {
            return Err(ServiceError::NotFound(format!("name = {}", missing)));
        }

        sqlx::query("DELETE FROM customer_role WHERE customer_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let role_ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
        sqlx::query("INSERT INTO customer_role (customer_id, role_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(user_id)
            .bind(&role_ids)
            .execute(&mut *conn)
            .await?;

        Ok(roles)
    }

    async fn with_roles(&self, user: User) -> Result<UserWithRoles, ServiceError> {
        let id = user.id;
        self.attach_roles(vec![user])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found_id(id))
    }

    async fn attach_roles(&self, users: Vec<User>) -> Result<Vec<UserWithRoles>, ServiceError> {
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut by_user: HashMap<i64, Vec<Role>> = HashMap::new();
        if !ids.is_empty() {
            let rows = sqlx::query_as::<_, UserRoleRow>(
                "SELECT cr.customer_id, r.id, r.name FROM customer_role cr \
                 JOIN role r ON r.id = cr.role_id \
                 WHERE cr.customer_id = ANY($1) ORDER BY r.id",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                by_user.entry(row.customer_id).or_default().push(row.into());
            }
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let roles = by_user.remove(&user.id).unwrap_or_default();
                UserWithRoles { user, roles }
            })
            .collect())
    }
}

/// Unique user column behind a constraint name
fn taken_field(constraint: Option<&str>) -> Option<TakenField> {
    match constraint? {
        USERNAME_KEY => Some(TakenField::Username),
        EMAIL_KEY => Some(TakenField::Email),
        _ => None,
    }
}

/// A concurrent writer can win the race past the existence checks; report the
/// collision the same way the checks would have
fn duplicate_account(err: sqlx::Error) -> ServiceError {
    let err = ServiceError::from(err);
    let constraint = match &err {
        ServiceError::Database(db) if db.is_unique_violation() => Some(db.constraint()),
        _ => None,
    };
    let Some(constraint) = constraint else {
        return err;
    };
    match taken_field(constraint.as_deref()) {
        Some(field) => ServiceError::AlreadyTaken(field),
        None => ServiceError::Conflict("Username or email is already in use".to_string()),
    }
}

fn taken_as_conflict(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::AlreadyTaken(field) => ServiceError::Conflict(field.to_string()),
        other => other,
    }
}
