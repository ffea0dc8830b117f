pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;

use axum::{
    http::HeaderValue,
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::config;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Full application router with global middleware
pub fn app(state: AppState) -> Router {
    let api = &config().api;

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::service::root))
        .route("/health", get(handlers::service::health))
        .merge(auth_routes())
        .merge(tag_routes())
        .merge(certificate_routes())
        .merge(user_routes())
        .merge(order_routes())
        .merge(role_routes())
        .with_state(state)
        // Global middleware
        .layer(from_fn(middleware::jwt_auth_middleware))
        .layer(RequestBodyLimitLayer::new(api.max_request_size_bytes))
        .layer(cors_layer());

    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer() -> CorsLayer {
    if crate::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refreshtoken", post(auth::refresh_token))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/claims", get(auth::claims))
}

fn tag_routes() -> Router<AppState> {
    use handlers::tags;

    Router::new()
        .route("/tags", get(tags::find_all).post(tags::create).patch(tags::update))
        .route("/tags/top-used-tag", get(tags::top_used_tag))
        .route("/tags/:id", get(tags::find_by_id).delete(tags::delete))
}

fn certificate_routes() -> Router<AppState> {
    use handlers::certificates;

    Router::new()
        .route(
            "/certificates",
            get(certificates::find_all)
                .post(certificates::create)
                .patch(certificates::update),
        )
        .route("/certificates/search", get(certificates::search))
        .route(
            "/certificates/:id",
            get(certificates::find_by_id).delete(certificates::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", get(users::find_all).post(users::create).patch(users::update))
        .route("/users/:id", get(users::find_by_id).delete(users::delete))
        .route("/users/:id/roles", put(users::assign_roles))
}

fn order_routes() -> Router<AppState> {
    use handlers::orders;

    Router::new()
        .route("/orders", get(orders::find_all).post(orders::create).patch(orders::update))
        .route("/orders/user", get(orders::find_all_by_user))
        .route("/orders/cost", get(orders::highest_cost))
        .route("/orders/:id", get(orders::find_by_id).delete(orders::delete))
        // Must reuse `:id`: one parameter name per path segment
        .route("/orders/:id/user", get(orders::find_by_user))
}

fn role_routes() -> Router<AppState> {
    use handlers::roles;

    Router::new()
        .route("/roles", get(roles::find_all).post(roles::create))
        .route("/roles/:name", delete(roles::delete))
}
