// handlers/tags.rs - /tags

use axum::extract::{RawQuery, State};
use serde::Deserialize;

use crate::api::format::TagDto;
use crate::config::config;
use crate::middleware::{check_id_of_current_user, AdminUser, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::TagService;
use crate::types::Page;
use crate::AppState;

use super::query_params;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub id: i64,
    pub name: String,
}

/// GET /tags/:id
pub async fn find_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<TagDto> {
    let tag = TagService::new(state.db).find_by_id(id).await?;
    Ok(ApiResponse::success(tag.into()))
}

/// GET /tags?page=&size=&sort=
pub async fn find_all(State(state): State<AppState>, raw: RawQuery) -> ApiResult<Page<TagDto>> {
    let request = query_params(raw).page_request(&config().pagination)?;
    let page = TagService::new(state.db).find_all(&request).await?;
    Ok(ApiResponse::success(page.map(TagDto::from)))
}

/// POST /tags {name}
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<CreateTagRequest>,
) -> ApiResult<TagDto> {
    let tag = TagService::new(state.db).create(&body.name).await?;
    Ok(ApiResponse::created(tag.into()))
}

/// PATCH /tags {id, name}
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<UpdateTagRequest>,
) -> ApiResult<TagDto> {
    let tag = TagService::new(state.db).update(body.id, &body.name).await?;
    Ok(ApiResponse::success(tag.into()))
}

/// DELETE /tags/:id
pub async fn delete(State(state): State<AppState>, _admin: AdminUser, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    TagService::new(state.db).delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /tags/top-used-tag?userId= - most used tag among the user's orders
pub async fn top_used_tag(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    raw: RawQuery,
) -> ApiResult<TagDto> {
    let user_id = query_params(raw).required_i64("userId")?;
    check_id_of_current_user(&claims, user_id)?;

    let tag = TagService::new(state.db).find_top_used_tag(user_id).await?;
    Ok(ApiResponse::success(tag.into()))
}
