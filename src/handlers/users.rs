// handlers/users.rs - /users

use axum::extract::{RawQuery, State};
use serde::Deserialize;

use crate::api::format::UserDto;
use crate::config::config;
use crate::middleware::{check_id_of_current_user, AdminUser, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::{NewUser, UserPatch};
use crate::services::UserService;
use crate::types::Page;
use crate::AppState;

use super::query_params;

#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    pub roles: Vec<String>,
}

/// GET /users/:id
pub async fn find_by_id(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<UserDto> {
    check_id_of_current_user(&claims, id)?;
    let user = UserService::new(state.db).find_by_id(id).await?;
    Ok(ApiResponse::success(user.into()))
}

/// GET /users?page=&size=&sort=
pub async fn find_all(State(state): State<AppState>, _admin: AdminUser, raw: RawQuery) -> ApiResult<Page<UserDto>> {
    let request = query_params(raw).page_request(&config().pagination)?;
    let page = UserService::new(state.db).find_all(&request).await?;
    Ok(ApiResponse::success(page.map(UserDto::from)))
}

/// POST /users
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<NewUser>,
) -> ApiResult<UserDto> {
    let user = UserService::new(state.db).create(body).await?;
    Ok(ApiResponse::created(user.into()))
}

/// PATCH /users {id, name?, email?, username?, password?}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(body): ApiJson<UserPatch>,
) -> ApiResult<UserDto> {
    check_id_of_current_user(&claims, body.id)?;
    let user = UserService::new(state.db).update(body).await?;
    Ok(ApiResponse::success(user.into()))
}

/// DELETE /users/:id
pub async fn delete(State(state): State<AppState>, _admin: AdminUser, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    UserService::new(state.db).delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /users/:id/roles {roles}
pub async fn assign_roles(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<AssignRolesRequest>,
) -> ApiResult<UserDto> {
    let user = UserService::new(state.db).assign_roles(id, &body.roles).await?;
    Ok(ApiResponse::success(user.into()))
}
