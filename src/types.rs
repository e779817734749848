//! Core type aliases and small shared types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;
pub type ApiTokenId = Uuid;

/// Abbreviate a UUID for log output (first 8 chars).
pub fn abbrev_uuid(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// A capability grant a user can hold.
///
/// Stored as kebab-case strings in the `user_capabilities` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Allows the user to hold and manage API tokens.
    AccessApi,
    /// Allows the user to administer other users and their tokens.
    ManageUsers,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::AccessApi => write!(f, "access-api"),
            Capability::ManageUsers => write!(f, "manage-users"),
        }
    }
}

/// The literal `current` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CurrentKeyword {
    Current,
}

/// Path parameter that accepts either a user UUID or the keyword `current`,
/// so the same routes serve `/users/{id}/...` and `/users/current/...`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum UserIdOrCurrent {
    Current(CurrentKeyword),
    #[schema(value_type = Uuid)]
    Id(UserId),
}
