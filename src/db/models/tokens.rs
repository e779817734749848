//! Database models for API tokens.

use crate::api::models::tokens::{ValidatedTokenCreate, ValidatedTokenUpdate};
use crate::types::{ApiTokenId, UserId};
use chrono::{DateTime, NaiveDate, Utc};

/// Parameters for a single insert attempt. The issuance loop constructs one
/// of these per attempt with a freshly generated client id.
#[derive(Debug, Clone)]
pub struct ApiTokenInsertDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub client_id: String,
    pub secret_hash: String,
    pub expires_at: NaiveDate,
}

/// Database request for updating a token. Carries only the mutable fields;
/// the client id and secret hash are deliberately absent so no update path
/// can touch them.
#[derive(Debug, Clone)]
pub struct ApiTokenUpdateDBRequest {
    pub name: String,
    pub expires_at: Option<NaiveDate>,
}

impl From<ValidatedTokenUpdate> for ApiTokenUpdateDBRequest {
    fn from(update: ValidatedTokenUpdate) -> Self {
        Self {
            name: update.name,
            expires_at: update.expires_at,
        }
    }
}

/// A token row. `secret_hash` never leaves the db layer in API responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiTokenDBResponse {
    pub id: ApiTokenId,
    pub name: String,
    pub client_id: String,
    pub secret_hash: String,
    pub user_id: UserId,
    pub expires_at: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for listing tokens.
#[derive(Debug, Clone, Default)]
pub struct ApiTokenFilter {
    pub user_id: Option<UserId>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ApiTokenInsertDBRequest {
    pub fn new(user_id: UserId, create: &ValidatedTokenCreate, client_id: String, secret_hash: String) -> Self {
        Self {
            user_id,
            name: create.name.clone(),
            client_id,
            secret_hash,
            expires_at: create.expires_at,
        }
    }
}
