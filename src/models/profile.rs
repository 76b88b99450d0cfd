use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The permission tier of an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including user management.
    #[postgres(name = "super_admin")]
    SuperAdmin,
    /// Content and organization management.
    #[postgres(name = "admin")]
    Admin,
    /// May author content but only edit their own.
    #[postgres(name = "kontributor")]
    Kontributor,
}

impl Role {
    /// Returns the wire/database name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Kontributor => "kontributor",
        }
    }

    /// Parses a role from its wire name.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "kontributor" => Some(Role::Kontributor),
            _ => None,
        }
    }
}

/// The application-level user record, distinct from the raw account identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The unique identifier, shared with the owning account.
    pub id: Uuid,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub full_name: Option<String>,
    /// The user's permission tier.
    pub role: Role,
    /// The user's avatar URL.
    pub avatar_url: Option<String>,
    /// The timestamp when the profile was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

/// An authentication identity. The profile row is created by a database
/// trigger when the account is inserted.
#[derive(Debug, Clone)]
pub struct Account {
    /// The unique identifier for the account.
    pub id: Uuid,
    /// The account's email address.
    pub email: String,
    /// The account's hashed password.
    pub password: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// The timestamp when the account was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Kontributor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("moderator"), None);
    }
}
