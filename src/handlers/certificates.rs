// handlers/certificates.rs - /certificates

use axum::extract::{RawQuery, State};

use crate::api::format::CertificateDto;
use crate::config::config;
use crate::middleware::{AdminUser, ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::certificate_service::{CertificatePatch, NewCertificate};
use crate::services::CertificateService;
use crate::types::Page;
use crate::AppState;

use super::query_params;

/// GET /certificates/:id
pub async fn find_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<CertificateDto> {
    let certificate = CertificateService::new(state.db).find_by_id(id).await?;
    Ok(ApiResponse::success(certificate.into()))
}

/// GET /certificates?page=&size=&sort=
pub async fn find_all(State(state): State<AppState>, raw: RawQuery) -> ApiResult<Page<CertificateDto>> {
    let request = query_params(raw).page_request(&config().pagination)?;
    let page = CertificateService::new(state.db).find_all(&request).await?;
    Ok(ApiResponse::success(page.map(CertificateDto::from)))
}

/// GET /certificates/search?name=&description=&tags=
///
/// `name` matches name or description, `description` matches description,
/// `tags` requires at least one of the listed tags. All given parameters must hold.
pub async fn search(State(state): State<AppState>, raw: RawQuery) -> ApiResult<Page<CertificateDto>> {
    let params = query_params(raw);
    let request = params.page_request(&config().pagination)?;
    let page = CertificateService::new(state.db)
        .search(&request, &params.certificate_search())
        .await?;
    Ok(ApiResponse::success(page.map(CertificateDto::from)))
}

/// POST /certificates
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<NewCertificate>,
) -> ApiResult<CertificateDto> {
    let certificate = CertificateService::new(state.db).create(body).await?;
    Ok(ApiResponse::created(certificate.into()))
}

/// PATCH /certificates {id, ...}
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<CertificatePatch>,
) -> ApiResult<CertificateDto> {
    let certificate = CertificateService::new(state.db).update(body).await?;
    Ok(ApiResponse::success(certificate.into()))
}

/// DELETE /certificates/:id
pub async fn delete(State(state): State<AppState>, _admin: AdminUser, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    CertificateService::new(state.db).delete(id).await?;
    Ok(ApiResponse::no_content())
}
