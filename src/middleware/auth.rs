use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;

/// Authenticated caller, decoded from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

/// Authenticated caller holding ROLE_ADMIN
#[derive(Clone, Debug)]
pub struct AdminUser(pub Claims);

/// Decodes `Authorization: Bearer <jwt>` when present and stores the caller in
/// request extensions. Requests without the header pass through anonymously;
/// handlers decide via the `AuthUser` / `AdminUser` extractors.
pub async fn jwt_auth_middleware(mut request: Request, next: Next) -> Response {
    match extract_jwt_from_headers(request.headers()) {
        Ok(None) => {}
        Ok(Some(token)) => match validate_jwt(&token) {
            Ok(claims) => {
                tracing::debug!("Authenticated request from '{}' (id {})", claims.sub, claims.user_id);
                request.extensions_mut().insert(AuthUser(claims));
            }
            Err(e) => {
                tracing::warn!("Rejected bearer token: {}", e);
                return ApiError::from(e).into_response();
            }
        },
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    }

    next.run(request).await
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Full authentication is required to access this resource"))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.is_admin() {
            Ok(AdminUser(claims))
        } else {
            tracing::warn!("User '{}' denied admin access", claims.sub);
            Err(ApiError::forbidden("Access is denied"))
        }
    }
}

/// Admins may act on any user id; everyone else only on their own
pub fn check_id_of_current_user(claims: &Claims, user_id: i64) -> Result<(), ApiError> {
    if claims.is_admin() || claims.user_id == user_id {
        Ok(())
    } else {
        tracing::warn!("User {} attempted to access data of user {}", claims.user_id, user_id);
        Err(ApiError::forbidden(format!("User id ({}) belongs to another user", user_id)))
    }
}
