//! Store-level error classification.
//!
//! Repositories return [`DbError`] so callers can react to constraint
//! violations (the issuance retry loop depends on recognising unique
//! violations on the client id) without parsing sqlx internals.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violation: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error("Foreign key constraint violation: {message}")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error("Check constraint violation: {message}")]
    CheckViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("Database error: {0}")]
    Other(#[source] sqlx::Error),
}

impl DbError {
    /// Whether this error is a unique violation on the given constraint.
    pub fn is_unique_violation_on(&self, constraint_name: &str) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint: Some(c), .. } if c == constraint_name
        )
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(String::from),
                        table: db_err.table().map(String::from),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(String::from),
                        table: db_err.table().map(String::from),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(String::from),
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::Other(sqlx::Error::Database(db_err))
                }
            }
            other => DbError::Other(other),
        }
    }
}
