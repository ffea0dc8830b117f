// handlers/service.rs - service banner and health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::AppState;

/// GET / - service name, version and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Gift Certificate API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Gift certificates, tags, orders and users behind a JWT-secured REST API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/login, /auth/refreshtoken, /auth/register (public); /auth/logout, /auth/claims (authenticated)",
                "tags": "/tags[/:id], /tags/top-used-tag?userId=",
                "certificates": "/certificates[/:id], /certificates/search",
                "users": "/users[/:id], /users/:id/roles",
                "orders": "/orders[/:id], /orders/user?userId=, /orders/:id/user?userId=, /orders/cost?userId=",
                "roles": "/roles[/:name] (admin)",
            }
        }
    }))
}

/// GET /health - 503 while the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": true,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
