//! API tokens repository.
//!
//! `create` performs a single insert attempt; the bounded retry over client
//! id collisions lives in [`crate::issuance`]. The update SQL names the two
//! mutable columns explicitly, so the client id and secret hash cannot be
//! overwritten through any update path.

use crate::db::errors::DbError;
use crate::db::handlers::repository::Repository;
use crate::db::models::tokens::{
    ApiTokenDBResponse, ApiTokenFilter, ApiTokenInsertDBRequest, ApiTokenUpdateDBRequest,
};
use crate::types::{abbrev_uuid, ApiTokenId, UserId};
use sqlx::PgConnection;
use tracing::instrument;

/// Name of the unique constraint on `api_tokens.client_id`. The issuance
/// loop matches on it to classify a collision as retryable.
pub const CLIENT_ID_CONSTRAINT: &str = "api_tokens_client_id_key";

const TOKEN_COLUMNS: &str = "id, name, client_id, secret_hash, user_id, expires_at, created_at, updated_at";

pub struct ApiTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ApiTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Cheap existence pre-check for a candidate client id. The unique
    /// constraint remains authoritative; this only avoids a doomed insert.
    #[instrument(skip(self, client_id), err)]
    pub async fn client_id_exists(&mut self, client_id: &str) -> Result<bool, DbError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM api_tokens WHERE client_id = $1)",
        )
        .bind(client_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(exists)
    }

    /// Fetch a token only if it belongs to the given user. Tokens of other
    /// users are indistinguishable from absent ones.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), token_id = %abbrev_uuid(&token_id)), err)]
    pub async fn get_for_user(
        &mut self,
        user_id: UserId,
        token_id: ApiTokenId,
    ) -> Result<Option<ApiTokenDBResponse>, DbError> {
        let token = sqlx::query_as::<_, ApiTokenDBResponse>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE id = $1 AND user_id = $2",
        ))
        .bind(token_id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(token)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ApiTokens<'c> {
    type CreateRequest = ApiTokenInsertDBRequest;
    type UpdateRequest = ApiTokenUpdateDBRequest;
    type Response = ApiTokenDBResponse;
    type Id = ApiTokenId;
    type Filter = ApiTokenFilter;

    #[instrument(skip(self, request), fields(name = %request.name, user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response, DbError> {
        let token = sqlx::query_as::<_, ApiTokenDBResponse>(&format!(
            r#"
            INSERT INTO api_tokens (name, client_id, secret_hash, user_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TOKEN_COLUMNS}
            "#,
        ))
        .bind(&request.name)
        .bind(&request.client_id)
        .bind(&request.secret_hash)
        .bind(request.user_id)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(token)
    }

    #[instrument(skip(self), fields(token_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>, DbError> {
        let token = sqlx::query_as::<_, ApiTokenDBResponse>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM api_tokens WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(token)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>, DbError> {
        let tokens = sqlx::query_as::<_, ApiTokenDBResponse>(&format!(
            r#"
            SELECT {TOKEN_COLUMNS} FROM api_tokens
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        ))
        .bind(filter.user_id)
        .bind(filter.skip.unwrap_or(0))
        .bind(filter.limit.unwrap_or(100))
        .fetch_all(&mut *self.db)
        .await?;
        Ok(tokens)
    }

    // Only name and expires_at are mutable. COALESCE keeps the stored expiry
    // when the request carries none.
    #[instrument(skip(self, request), fields(token_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response, DbError> {
        let token = sqlx::query_as::<_, ApiTokenDBResponse>(&format!(
            r#"
            UPDATE api_tokens
            SET name = $2,
                expires_at = COALESCE($3, expires_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TOKEN_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&request.name)
        .bind(request.expires_at)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(token)
    }

    #[instrument(skip(self), fields(token_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
