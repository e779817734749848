//! API-layer models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::{Capability, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The authenticated caller, resolved by the auth extractor.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub capabilities: Vec<Capability>,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            capabilities: user.capabilities,
        }
    }
}

/// Request body for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Capability grants for the new user.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Request body for updating a user. Omitted fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Replacement capability set
    #[serde(default)]
    pub capabilities: Option<Vec<Capability>>,
}

/// A user as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub capabilities: Vec<Capability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            capabilities: user.capabilities,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Pagination parameters for listing users.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Number of records to skip
    #[param(default = 0)]
    pub skip: Option<i64>,
    /// Maximum number of records to return
    #[param(default = 100)]
    pub limit: Option<i64>,
}
