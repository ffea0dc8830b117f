use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::models::role::{normalize_role_name, BUILTIN_ROLES};
use crate::database::models::Role;
use crate::database::Repository;
use crate::filter::SortWhitelist;
use crate::types::{Page, PageRequest};

use super::{require_text, ServiceError};

pub const ROLE_SORT: SortWhitelist = &[("id", "id"), ("name", "name")];

pub struct RoleService {
    pool: PgPool,
}

impl RoleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<Role>, ServiceError> {
        debug!("Retrieving roles. Page request: {:?}", request);
        let (roles, total) = Repository::<Role>::new("role", self.pool.clone())
            .select_page(request.to_filter_data(ROLE_SORT)?)
            .await?;
        Ok(Page::new(roles, request, total))
    }

    pub async fn create(&self, name: &str) -> Result<Role, ServiceError> {
        require_text("name", name)?;
        let name = normalize_role_name(name);
        debug!("Creating role {}", name);

        let role = sqlx::query_as::<_, Role>("INSERT INTO role (name) VALUES ($1) RETURNING id, name")
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = ServiceError::from(e);
                if err.is_unique_violation() {
                    ServiceError::Conflict(format!("Role ({}) already exists", name))
                } else {
                    err
                }
            })?;

        info!("Role {} created with id {}", role.name, role.id);
        Ok(role)
    }

    /// Built-in roles stay; other roles are detached from their users
    pub async fn delete(&self, name: &str) -> Result<(), ServiceError> {
        let name = normalize_role_name(name);
        debug!("Deleting role {}", name);

        if BUILTIN_ROLES.contains(&name.as_str()) {
            return Err(ServiceError::Conflict(format!("Role ({}) is built in and cannot be deleted", name)));
        }

        let result = sqlx::query("DELETE FROM role WHERE name = $1")
            .bind(&name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("name = {}", name)));
        }

        info!("Role {} deleted", name);
        Ok(())
    }
}
