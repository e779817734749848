//! Service-level error types and their HTTP mapping.
//!
//! Handlers return [`Error`]; its [`IntoResponse`] impl converts each variant
//! to a status code and a safe user-facing message, logging the full error at
//! a severity matched to the class of failure.

use crate::db::errors::DbError;
use crate::types::Capability;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication required")]
    Unauthenticated { message: Option<String> },

    #[error("Insufficient permissions: requires {required} for {resource}")]
    InsufficientPermissions {
        required: Capability,
        resource: String,
    },

    #[error("Validation failed for {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Could not allocate a unique client id after {attempts} attempts")]
    IssuanceFailed { attempts: u32 },

    #[error("Internal error during {operation}")]
    Internal { operation: String },

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::IssuanceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A message safe to return to the client. Internal details stay in logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { required, resource } => {
                format!("Insufficient permissions: requires {required} for {resource}")
            }
            Error::Validation { field, message } => format!("{field}: {message}"),
            Error::NotFound { resource, id } => format!("{resource} not found: {id}"),
            Error::IssuanceFailed { .. } => "Failed to issue token, please retry".to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("users") => "A user with this email already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Referenced resource does not exist".to_string(),
                DbError::CheckViolation { .. } => "Invalid value".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Error::Internal { .. } | Error::Other(_) | Error::IssuanceFailed { .. } => {
                error!(error = ?self, "Request failed");
            }
            Error::Database(DbError::Other(_)) => {
                error!(error = ?self, "Database failure");
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                info!(error = %self, "Request denied");
            }
            Error::Database(_) => {
                warn!(error = %self, "Database constraint rejected request");
            }
            _ => {
                debug!(error = %self, "Client error");
            }
        }

        let body = match &self {
            Error::Validation { field, message } => json!({
                "error": self.user_message(),
                "field": field,
                "message": message,
            }),
            _ => json!({ "error": self.user_message() }),
        };

        (status, Json(body)).into_response()
    }
}
