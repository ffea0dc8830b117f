use serde_json::json;

use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::services::user_service::NewUser;
use crate::services::UserService;

pub struct AdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

pub async fn create_admin(request: AdminRequest, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = UserService::new(super::connect().await?);

    let user = users
        .create_admin(NewUser {
            name: request.name,
            email: request.email,
            username: request.username,
            password: request.password,
            role: None,
        })
        .await?;

    output_success(
        output_format,
        &format!("Admin '{}' created", user.user.username),
        Some(json!({
            "id": user.user.id,
            "username": user.user.username,
            "roles": user.role_names(),
        })),
    )?;
    output_details(
        output_format,
        &[("id", user.user.id.to_string()), ("roles", user.role_names().join(", "))],
    );
    Ok(())
}
