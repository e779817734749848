//! Database models for users.

use crate::api::models::users::{UserCreate, UserUpdate};
use crate::types::{Capability, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a user.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub capabilities: Vec<Capability>,
    pub auth_source: String,
}

impl From<UserCreate> for UserCreateDBRequest {
    fn from(api: UserCreate) -> Self {
        Self {
            email: api.email,
            display_name: api.display_name,
            capabilities: api.capabilities,
            auth_source: "api".to_string(),
        }
    }
}

/// Database request for updating a user. `None` fields are left unchanged;
/// `capabilities: Some(..)` replaces the full grant set.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub capabilities: Option<Vec<Capability>>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(update: UserUpdate) -> Self {
        Self {
            display_name: update.display_name,
            capabilities: update.capabilities,
        }
    }
}

/// A user row plus their capability grants.
///
/// Capabilities live in a separate table; repositories fill the field with a
/// second query after fetching the row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub auth_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub capabilities: Vec<Capability>,
}

/// Filter for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}
