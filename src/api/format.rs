use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::{CertificateWithTags, OrderDetails, Role, Tag, UserWithRoles};
use crate::services::auth_service::{LoginSession, RefreshedSession};

pub const TOKEN_TYPE: &str = "Bearer";

/// Timestamps render as `yyyy-MM-ddTHH:mm:ss.SSS`, UTC
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
}

impl Link {
    pub fn self_link(href: String) -> Vec<Link> {
        vec![Link { rel: "self", href }]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    pub links: Vec<Link>,
}

impl From<Tag> for TagDto {
    fn from(tag: Tag) -> Self {
        Self {
            links: Link::self_link(format!("/tags/{}", tag.id)),
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration: Option<i32>,
    pub tags: Vec<TagDto>,
    pub create_date: String,
    pub last_update_date: String,
    pub links: Vec<Link>,
}

impl From<CertificateWithTags> for CertificateDto {
    fn from(value: CertificateWithTags) -> Self {
        let c = value.certificate;
        Self {
            links: Link::self_link(format!("/certificates/{}", c.id)),
            id: c.id,
            name: c.name,
            description: c.description,
            price: c.price,
            duration: c.duration,
            tags: value.tags.into_iter().map(TagDto::from).collect(),
            create_date: format_date(&c.created_date),
            last_update_date: format_date(&c.last_update_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleDto {
    pub id: i64,
    pub name: String,
    pub links: Vec<Link>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            links: Link::self_link(format!("/roles/{}", role.name)),
            id: role.id,
            name: role.name,
        }
    }
}

/// User as returned by the API; the password hash never leaves the service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub username: String,
    pub roles: Vec<RoleDto>,
    pub create_date: String,
    pub last_update_date: String,
    pub links: Vec<Link>,
}

impl From<UserWithRoles> for UserDto {
    fn from(value: UserWithRoles) -> Self {
        let u = value.user;
        Self {
            links: Link::self_link(format!("/users/{}", u.id)),
            id: u.id,
            name: u.name,
            email: u.email,
            username: u.username,
            roles: value.roles.into_iter().map(RoleDto::from).collect(),
            create_date: format_date(&u.created_date),
            last_update_date: format_date(&u.last_update_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    pub price: Option<Decimal>,
    pub user: UserDto,
    pub certificate: CertificateDto,
    pub create_date: String,
    pub last_update_date: String,
    pub links: Vec<Link>,
}

impl From<OrderDetails> for OrderDto {
    fn from(value: OrderDetails) -> Self {
        let o = value.order;
        Self {
            links: Link::self_link(format!("/orders/{}", o.id)),
            id: o.id,
            price: o.price,
            user: value.user.into(),
            certificate: value.certificate.into(),
            create_date: format_date(&o.created_date),
            last_update_date: format_date(&o.last_update_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub refresh_token: String,
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<LoginSession> for JwtResponse {
    fn from(session: LoginSession) -> Self {
        Self {
            token: session.access_token,
            token_type: TOKEN_TYPE,
            refresh_token: session.refresh_token,
            roles: session.user.role_names(),
            id: session.user.user.id,
            username: session.user.user.username,
            email: session.user.user.email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl From<RefreshedSession> for TokenRefreshResponse {
    fn from(session: RefreshedSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: TOKEN_TYPE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestCostResponse {
    pub highest_cost: Decimal,
}
