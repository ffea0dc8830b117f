// handlers/mod.rs - one module per resource
//
// Access is enforced per handler through extractors:
//   public         no extractor
//   authenticated  AuthUser (401 without a valid bearer token)
//   self           AuthUser + check_id_of_current_user on the target user id
//   admin          AdminUser (403 without ROLE_ADMIN)

pub mod auth;
pub mod certificates;
pub mod orders;
pub mod roles;
pub mod service;
pub mod tags;
pub mod users;

use axum::extract::RawQuery;

use crate::api::query::QueryParams;

pub(crate) fn query_params(RawQuery(raw): RawQuery) -> QueryParams {
    QueryParams::parse(raw.as_deref())
}
