// handlers/orders.rs - /orders

use axum::extract::{RawQuery, State};

use crate::api::format::{HighestCostResponse, OrderDto};
use crate::config::config;
use crate::middleware::{check_id_of_current_user, AdminUser, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::order_service::{NewOrder, OrderPatch};
use crate::services::OrderService;
use crate::types::Page;
use crate::AppState;

use super::query_params;

/// GET /orders/:id
pub async fn find_by_id(State(state): State<AppState>, _admin: AdminUser, ApiPath(id): ApiPath<i64>) -> ApiResult<OrderDto> {
    let order = OrderService::new(state.db).find_by_id(id).await?;
    Ok(ApiResponse::success(order.into()))
}

/// GET /orders?page=&size=&sort=
pub async fn find_all(State(state): State<AppState>, _admin: AdminUser, raw: RawQuery) -> ApiResult<Page<OrderDto>> {
    let request = query_params(raw).page_request(&config().pagination)?;
    let page = OrderService::new(state.db).find_all(&request).await?;
    Ok(ApiResponse::success(page.map(OrderDto::from)))
}

/// POST /orders {userId, certificateId} - callers may only order for themselves
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(body): ApiJson<NewOrder>,
) -> ApiResult<OrderDto> {
    check_id_of_current_user(&claims, body.user_id)?;
    let order = OrderService::new(state.db).create(body).await?;
    Ok(ApiResponse::created(order.into()))
}

/// PATCH /orders {id, price?, user?, certificate?}
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(body): ApiJson<OrderPatch>,
) -> ApiResult<OrderDto> {
    let order = OrderService::new(state.db).update(body).await?;
    Ok(ApiResponse::success(order.into()))
}

/// DELETE /orders/:id
pub async fn delete(State(state): State<AppState>, _admin: AdminUser, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    OrderService::new(state.db).delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /orders/:order_id/user?userId=
pub async fn find_by_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(order_id): ApiPath<i64>,
    raw: RawQuery,
) -> ApiResult<OrderDto> {
    let user_id = query_params(raw).required_i64("userId")?;
    check_id_of_current_user(&claims, user_id)?;

    let order = OrderService::new(state.db).find_by_user(order_id, user_id).await?;
    Ok(ApiResponse::success(order.into()))
}

/// GET /orders/user?userId=&page=&size=&sort=
pub async fn find_all_by_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    raw: RawQuery,
) -> ApiResult<Page<OrderDto>> {
    let params = query_params(raw);
    let user_id = params.required_i64("userId")?;
    check_id_of_current_user(&claims, user_id)?;

    let request = params.page_request(&config().pagination)?;
    let page = OrderService::new(state.db).find_all_by_user(user_id, &request).await?;
    Ok(ApiResponse::success(page.map(OrderDto::from)))
}

/// GET /orders/cost?userId=
pub async fn highest_cost(
    State(state): State<AppState>,
    _admin: AdminUser,
    raw: RawQuery,
) -> ApiResult<HighestCostResponse> {
    let user_id = query_params(raw).required_i64("userId")?;
    let highest_cost = OrderService::new(state.db).highest_cost(user_id).await?;
    Ok(ApiResponse::success(HighestCostResponse { highest_cost }))
}
