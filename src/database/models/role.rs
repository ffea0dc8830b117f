use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Roles created by the initial migration; they cannot be deleted
pub const BUILTIN_ROLES: [&str; 2] = [ROLE_USER, ROLE_ADMIN];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Role row joined with the user holding it
#[derive(Debug, Clone, FromRow)]
pub struct UserRoleRow {
    pub customer_id: i64,
    pub id: i64,
    pub name: String,
}

impl From<UserRoleRow> for Role {
    fn from(row: UserRoleRow) -> Self {
        Role { id: row.id, name: row.name }
    }
}

/// Normalise a role name: upper case with the `ROLE_` prefix
pub fn normalize_role_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    if upper.starts_with("ROLE_") {
        upper
    } else {
        format!("ROLE_{}", upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_role_names() {
        assert_eq!(normalize_role_name("admin"), "ROLE_ADMIN");
        assert_eq!(normalize_role_name(" manager "), "ROLE_MANAGER");
        assert_eq!(normalize_role_name("ROLE_USER"), "ROLE_USER");
        assert_eq!(normalize_role_name("role_auditor"), "ROLE_AUDITOR");
    }
}
