pub mod auth;
pub mod response;

pub use auth::{check_id_of_current_user, jwt_auth_middleware, AdminUser, AuthUser};
pub use response::{ApiJson, ApiPath, ApiResponse, ApiResult};
