use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::database::models::Tag;
use crate::database::Repository;
use crate::filter::SortWhitelist;
use crate::types::{Page, PageRequest};

use super::{require_text, ServiceError};

pub const TAG_SORT: SortWhitelist = &[("id", "id"), ("name", "name")];

pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<Tag> {
        Repository::new("tag", self.pool.clone())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Tag, ServiceError> {
        debug!("Looking for a tag with id {}", id);
        let tag = self
            .repository()
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found_id(id))?;
        info!("Found a tag with id {}", id);
        Ok(tag)
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<Tag>, ServiceError> {
        debug!("Retrieving tags. Page request: {:?}", request);
        let (tags, total) = self.repository().select_page(request.to_filter_data(TAG_SORT)?).await?;
        info!("Retrieved {} tags of {} total", tags.len(), total);
        Ok(Page::new(tags, request, total))
    }

    pub async fn create(&self, name: &str) -> Result<Tag, ServiceError> {
        debug!("Creating a new tag {}", name);
        require_text("name", name)?;

        let tag = sqlx::query_as::<_, Tag>("INSERT INTO tag (name) VALUES ($1) RETURNING id, name")
            .bind(name.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| duplicate_name(e, name))?;

        info!("Tag created with id {}", tag.id);
        Ok(tag)
    }

    pub async fn update(&self, id: i64, name: &str) -> Result<Tag, ServiceError> {
        debug!("Updating a tag with id {}", id);
        require_text("name", name)?;

        let tag = sqlx::query_as::<_, Tag>("UPDATE tag SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate_name(e, name))?
            .ok_or_else(|| ServiceError::not_found_id(id))?;

        info!("Tag with id {} updated", id);
        Ok(tag)
    }

    /// Removing a tag also detaches it from every certificate
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        debug!("Deleting tag with id {}", id);
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found_id(id));
        }
        info!("Tag with id {} is deleted", id);
        Ok(())
    }

    /// Most frequent tag across the certificates the user ordered; ties go to the lowest tag id
    pub async fn find_top_used_tag(&self, user_id: i64) -> Result<Tag, ServiceError> {
        debug!("Looking for the most used tag of user {}", user_id);

        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if !user_exists {
            return Err(ServiceError::not_found_id(user_id));
        }

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM cert_order o
            JOIN certificate_tag ct ON ct.cert_id = o.cert_id
            JOIN tag t ON t.id = ct.tag_id
            WHERE o.customer_id = $1
            GROUP BY t.id, t.name
            ORDER BY COUNT(*) DESC, t.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("userId = {}", user_id)))?;

        info!("The most used tag of user {} is {}", user_id, tag.id);
        Ok(tag)
    }

    /// Resolve tag names to rows, inserting the missing ones. Blank and
    /// duplicate names are skipped; result order follows first occurrence.
    pub(crate) async fn find_or_create(conn: &mut PgConnection, names: &[String]) -> Result<Vec<Tag>, ServiceError> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            if tags.iter().any(|t| t.name == name) {
                continue;
            }
            let tag = sqlx::query_as::<_, Tag>(
                "INSERT INTO tag (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id, name",
            )
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
            tags.push(tag);
        }
        Ok(tags)
    }
}

fn duplicate_name(err: sqlx::Error, name: &str) -> ServiceError {
    let err = ServiceError::from(err);
    if err.is_unique_violation() {
        ServiceError::Conflict(format!("Tag with name ({}) already exists", name.trim()))
    } else {
        err
    }
}
