use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::database::models::tag::CertificateTagRow;
use crate::database::models::{Certificate, CertificateWithTags, Tag};
use crate::database::Repository;
use crate::filter::{CertificateSearch, SortWhitelist};
use crate::types::{Page, PageRequest};

use super::tag_service::TagService;
use super::{require_text, validate_price, ServiceError};

pub const CERTIFICATE_SORT: SortWhitelist = &[
    ("id", "id"),
    ("name", "name"),
    ("description", "description"),
    ("price", "price"),
    ("duration", "duration"),
    ("createDate", "created_date"),
    ("lastUpdateDate", "last_update_date"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct TagName {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration: Option<i32>,
    #[serde(default)]
    pub tags: Vec<TagName>,
}

/// Partial update; absent fields keep their value, `tags` replaces the whole set
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePatch {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration: Option<i32>,
    pub tags: Option<Vec<TagName>>,
}

pub struct CertificateService {
    pool: PgPool,
}

impl CertificateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Repository<Certificate> {
        Repository::new("gift_certificate", self.pool.clone())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<CertificateWithTags, ServiceError> {
        debug!("Looking for a gift certificate with id {}", id);
        let certificate = self
            .repository()
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found_id(id))?;
        let mut with_tags = self.attach_tags(vec![certificate]).await?;
        info!("Found a gift certificate with id {}", id);
        with_tags.pop().ok_or_else(|| ServiceError::not_found_id(id))
    }

    pub async fn exists(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.repository().exists(id).await?)
    }

    pub async fn find_all(&self, request: &PageRequest) -> Result<Page<CertificateWithTags>, ServiceError> {
        self.search(request, &CertificateSearch::default()).await
    }

    pub async fn search(
        &self,
        request: &PageRequest,
        search: &CertificateSearch,
    ) -> Result<Page<CertificateWithTags>, ServiceError> {
        debug!("Searching gift certificates by {:?}. Page request: {:?}", search, request);

        let mut filter_data = request.to_filter_data(CERTIFICATE_SORT)?;
        filter_data.conditions = search.to_conditions();

        let (certificates, total) = self.repository().select_page(filter_data).await?;
        let content = self.attach_tags(certificates).await?;

        info!("Found {} gift certificates of {} total", content.len(), total);
        Ok(Page::new(content, request, total))
    }

    /// Certificates keyed by id, with their tags
    pub async fn find_many(&self, ids: &[i64]) -> Result<HashMap<i64, CertificateWithTags>, ServiceError> {
        let certificates = self.repository().select_ids(ids).await?;
        Ok(self
            .attach_tags(certificates)
            .await?
            .into_iter()
            .map(|c| (c.certificate.id, c))
            .collect())
    }

    pub async fn create(&self, request: NewCertificate) -> Result<CertificateWithTags, ServiceError> {
        debug!("Creating a new gift certificate {}", request.name);
        require_text("name", &request.name)?;
        validate_amounts(request.price, request.duration)?;

        let mut tx = self.pool.begin().await?;

        let certificate = sqlx::query_as::<_, Certificate>(
            "INSERT INTO gift_certificate (name, description, price, duration) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(request.price)
        .bind(request.duration)
        .fetch_one(&mut *tx)
        .await?;

        let names: Vec<String> = request.tags.into_iter().map(|t| t.name).collect();
        let tags = Self::replace_tags(&mut tx, certificate.id, &names).await?;

        tx.commit().await?;

        info!("Gift certificate created with id {}", certificate.id);
        Ok(CertificateWithTags { certificate, tags })
    }

    pub async fn update(&self, patch: CertificatePatch) -> Result<CertificateWithTags, ServiceError> {
        debug!("Updating gift certificate with id {}", patch.id);
        if let Some(name) = &patch.name {
            require_text("name", name)?;
        }
        validate_amounts(patch.price, patch.duration)?;

        let mut tx = self.pool.begin().await?;

        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            UPDATE gift_certificate SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                duration = COALESCE($5, duration),
                last_update_date = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(patch.id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(&patch.description)
        .bind(patch.price)
        .bind(patch.duration)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found_id(patch.id))?;

        if let Some(tags) = &patch.tags {
            let names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
            Self::replace_tags(&mut tx, certificate.id, &names).await?;
        }

        tx.commit().await?;
        info!("Gift certificate with id {} updated", certificate.id);

        let mut with_tags = self.attach_tags(vec![certificate]).await?;
        with_tags.pop().ok_or_else(|| ServiceError::not_found_id(patch.id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        debug!("Deleting gift certificate with id {}", id);

        if !self.exists(id).await? {
            return Err(ServiceError::not_found_id(id));
        }

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cert_order WHERE cert_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Gift certificate cannot be deleted - has found in ({}) orders",
                orders
            )));
        }

        sqlx::query("DELETE FROM gift_certificate WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Gift certificate with id {} is deleted", id);
        Ok(())
    }

    /// Set the certificate's tags to `names`, creating unknown tags
    pub(crate) async fn replace_tags(
        conn: &mut PgConnection,
        certificate_id: i64,
        names: &[String],
    ) -> Result<Vec<Tag>, ServiceError> {
        let tags = TagService::find_or_create(conn, names).await?;

        sqlx::query("DELETE FROM certificate_tag WHERE cert_id = $1")
            .bind(certificate_id)
            .execute(&mut *conn)
            .await?;

        let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        if !tag_ids.is_empty() {
            sqlx::query("INSERT INTO certificate_tag (cert_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
                .bind(certificate_id)
                .bind(&tag_ids)
                .execute(&mut *conn)
                .await?;
        }
        Ok(tags)
    }

    async fn attach_tags(&self, certificates: Vec<Certificate>) -> Result<Vec<CertificateWithTags>, ServiceError> {
        let ids: Vec<i64> = certificates.iter().map(|c| c.id).collect();
        let mut tags = self.load_tags(&ids).await?;
        Ok(certificates
            .into_iter()
            .map(|certificate| {
                let tags = tags.remove(&certificate.id).unwrap_or_default();
                CertificateWithTags { certificate, tags }
            })
            .collect())
    }

    async fn load_tags(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, ServiceError> {
        let mut by_certificate: HashMap<i64, Vec<Tag>> = HashMap::new();
        if ids.is_empty() {
            return Ok(by_certificate);
        }

        let rows = sqlx::query_as::<_, CertificateTagRow>(
            "SELECT ct.cert_id, t.id, t.name FROM certificate_tag ct \
             JOIN tag t ON t.id = ct.tag_id \
             WHERE ct.cert_id = ANY($1) ORDER BY t.id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            by_certificate.entry(row.cert_id).or_default().push(row.into());
        }
        Ok(by_certificate)
    }
}

fn validate_amounts(price: Option<Decimal>, duration: Option<i32>) -> Result<(), ServiceError> {
    validate_price(price)?;
    if matches!(duration, Some(d) if d < 0) {
        return Err(ServiceError::validation("duration", "must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_reads_camel_case_with_tag_objects() {
        let request: NewCertificate = serde_json::from_value(json!({
            "name": "Spa day",
            "price": 49.99,
            "duration": 30,
            "tags": [{"name": "relax"}, {"name": "spa"}]
        }))
        .unwrap();
        assert_eq!(request.price, Some(Decimal::new(4999, 2)));
        assert_eq!(request.tags.len(), 2);
        assert!(request.description.is_none());
    }

    #[test]
    fn patch_distinguishes_absent_tags() {
        let patch: CertificatePatch = serde_json::from_value(json!({"id": 3, "name": "New"})).unwrap();
        assert!(patch.tags.is_none());
        let patch: CertificatePatch = serde_json::from_value(json!({"id": 3, "tags": []})).unwrap();
        assert_eq!(patch.tags.map(|t| t.len()), Some(0));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(validate_amounts(Some(Decimal::new(-1, 0)), None).is_err());
        assert!(validate_amounts(None, Some(-5)).is_err());
        assert!(validate_amounts(Some(Decimal::ZERO), Some(0)).is_ok());
    }

    #[test]
    fn rejects_prices_wider_than_the_column() {
        let request: NewCertificate = serde_json::from_value(json!({"name": "x", "price": 1e11})).unwrap();
        let err = validate_amounts(request.price, request.duration).unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref field, .. } if field == "price"));
        assert!(validate_amounts(Some(Decimal::new(999_999_999_999, 2)), None).is_ok());
    }
}
