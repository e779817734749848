//! API-layer models for API tokens, including request validation.
//!
//! Incoming payloads carry the expiry as a `YYYY-MM-DD` string; validation
//! converts them into typed parameter structs before anything touches the
//! store. The response model never exposes the stored secret hash, and the
//! plaintext secret is attached only at the two disclosure points (issuance
//! and the first retrieve afterwards).

use crate::db::models::tokens::ApiTokenDBResponse;
use crate::errors::{Error, Result};
use crate::types::{ApiTokenId, UserId};
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Maximum accepted token name length.
pub const NAME_MAX_LEN: usize = 250;

/// Expiry dates are calendar dates in this format.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Tokens without an explicit expiry get one this far in the future.
pub const DEFAULT_EXPIRY_YEARS: u32 = 100;

/// Request body for issuing a token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiTokenCreate {
    /// Human-readable token name (required, at most 250 characters)
    pub name: String,
    /// Expiry date in `YYYY-MM-DD` format; defaults to 100 years from today
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Request body for updating a token. Only the name and expiry are mutable;
/// client id and secret are fixed for the lifetime of the token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiTokenUpdate {
    /// New token name (required, at most 250 characters)
    pub name: String,
    /// New expiry date in `YYYY-MM-DD` format; omitted keeps the current one
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Validated issuance parameters.
#[derive(Debug, Clone)]
pub struct ValidatedTokenCreate {
    pub name: String,
    pub expires_at: NaiveDate,
}

/// Validated update parameters.
#[derive(Debug, Clone)]
pub struct ValidatedTokenUpdate {
    pub name: String,
    pub expires_at: Option<NaiveDate>,
}

impl ApiTokenCreate {
    pub fn validate(self) -> Result<ValidatedTokenCreate> {
        let name = validate_name(self.name)?;
        let expires_at = match self.expires_at {
            Some(raw) => parse_expiry(&raw)?,
            None => default_expiry(Utc::now().date_naive()),
        };
        Ok(ValidatedTokenCreate { name, expires_at })
    }
}

impl ApiTokenUpdate {
    pub fn validate(self) -> Result<ValidatedTokenUpdate> {
        let name = validate_name(self.name)?;
        let expires_at = self.expires_at.as_deref().map(parse_expiry).transpose()?;
        Ok(ValidatedTokenUpdate { name, expires_at })
    }
}

fn validate_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            field: "name",
            message: "must not be empty".to_string(),
        });
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(Error::Validation {
            field: "name",
            message: format!("must be at most {NAME_MAX_LEN} characters"),
        });
    }
    Ok(name)
}

fn parse_expiry(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, EXPIRY_FORMAT).map_err(|_| Error::Validation {
        field: "expires_at",
        message: format!("must be a valid date in {EXPIRY_FORMAT} format"),
    })
}

fn default_expiry(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(12 * DEFAULT_EXPIRY_YEARS))
        .unwrap_or(NaiveDate::MAX)
}

/// A token as returned by the API. `client_secret` is present only on the
/// issuance response and on the first retrieve that consumes the vault slot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiTokenResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: ApiTokenId,
    pub name: String,
    pub client_id: String,
    #[schema(value_type = uuid::Uuid)]
    pub user_id: UserId,
    pub expires_at: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Plaintext client secret, disclosed exactly once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl From<ApiTokenDBResponse> for ApiTokenResponse {
    fn from(token: ApiTokenDBResponse) -> Self {
        Self {
            id: token.id,
            name: token.name,
            client_id: token.client_id,
            user_id: token.user_id,
            expires_at: token.expires_at,
            created_at: token.created_at,
            updated_at: token.updated_at,
            client_secret: None,
        }
    }
}

impl ApiTokenResponse {
    pub fn with_secret(mut self, secret: String) -> Self {
        self.client_secret = Some(secret);
        self
    }
}

/// Pagination parameters for listing tokens.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListTokensQuery {
    /// Number of records to skip
    #[param(default = 0)]
    pub skip: Option<i64>,
    /// Maximum number of records to return
    #[param(default = 100)]
    pub limit: Option<i64>,
}
