// handlers/roles.rs - /roles (admin only)

use axum::extract::{RawQuery, State};
use serde::Deserialize;

use crate::api::format::RoleDto;
use crate::config::config;
use crate::middleware::{AdminUser, ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::RoleService;
use crate::types::Page;
use crate::AppState;

use super::query_params;

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// GET /roles
pub async fn find_all(State(state): State<AppState>, _admin: AdminUser, raw: RawQuery) -> ApiResult<Page<RoleDto>> {
    let request = query_params(raw).page_request(&config().pagination)?;
    let page = RoleService::new(state.db).find_all(&request).await?;
    Ok(ApiResponse::success(page.map(RoleDto::from)))
}

/// POST /roles {name} - "auditor" becomes ROLE_AUDITOR
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<CreateRoleRequest>,
) -> ApiResult<RoleDto> {
    let role = RoleService::new(state.db).create(&body.name).await?;
    Ok(ApiResponse::created(role.into()))
}

/// DELETE /roles/:name
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(name): ApiPath<String>,
) -> ApiResult<()> {
    RoleService::new(state.db).delete(&name).await?;
    Ok(ApiResponse::no_content())
}
