// handlers/auth.rs - /auth session endpoints

use axum::extract::State;
use serde::Deserialize;

use crate::api::format::{JwtResponse, MessageResponse, TokenRefreshResponse};
use crate::auth::Claims;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::NewUser;
use crate::services::AuthService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshRequest {
    pub refresh_token: String,
}

/// POST /auth/login - issue an access token and a refresh token
pub async fn login(State(state): State<AppState>, ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<JwtResponse> {
    let session = AuthService::new(state.db).login(&body.username, &body.password).await?;
    Ok(ApiResponse::success(session.into()))
}

/// POST /auth/refreshtoken - exchange a refresh token for a new access token
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenRefreshRequest>,
) -> ApiResult<TokenRefreshResponse> {
    let session = AuthService::new(state.db).refresh(&body.refresh_token).await?;
    Ok(ApiResponse::success(session.into()))
}

/// POST /auth/register
pub async fn register(State(state): State<AppState>, ApiJson(body): ApiJson<NewUser>) -> ApiResult<MessageResponse> {
    AuthService::new(state.db).register(body).await?;
    Ok(ApiResponse::success(MessageResponse::new("User registered successfully!")))
}

/// POST /auth/logout - drop the caller's refresh token
pub async fn logout(State(state): State<AppState>, AuthUser(claims): AuthUser) -> ApiResult<MessageResponse> {
    AuthService::new(state.db).logout(claims.user_id).await?;
    Ok(ApiResponse::success(MessageResponse::new("Log out successful!")))
}

/// GET /auth/claims
pub async fn claims(AuthUser(claims): AuthUser) -> ApiResult<Claims> {
    Ok(ApiResponse::success(claims))
}
