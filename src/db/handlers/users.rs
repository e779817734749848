//! Users repository.

use crate::db::errors::DbError;
use crate::db::handlers::repository::Repository;
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest};
use crate::types::{abbrev_uuid, Capability, UserId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn capabilities_for(&mut self, user_id: UserId) -> Result<Vec<Capability>, DbError> {
        let capabilities = sqlx::query_scalar::<_, Capability>(
            "SELECT capability FROM user_capabilities WHERE user_id = $1 ORDER BY capability",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(capabilities)
    }

    async fn grant_capabilities(&mut self, user_id: UserId, capabilities: &[Capability]) -> Result<(), DbError> {
        for capability in capabilities {
            sqlx::query(
                "INSERT INTO user_capabilities (user_id, capability) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(capability)
            .execute(&mut *self.db)
            .await?;
        }
        Ok(())
    }

    /// Fetch a user by email, `None` if absent. Used by the auth extractor.
    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>, DbError> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, display_name, auth_source, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        match user {
            Some(mut user) => {
                user.capabilities = self.capabilities_for(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response, DbError> {
        let mut user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (email, display_name, auth_source)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, auth_source, created_at, updated_at
            "#,
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(&request.auth_source)
        .fetch_one(&mut *self.db)
        .await?;

        self.grant_capabilities(user.id, &request.capabilities).await?;
        user.capabilities = self.capabilities_for(user.id).await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>, DbError> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, display_name, auth_source, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        match user {
            Some(mut user) => {
                user.capabilities = self.capabilities_for(user.id).await?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>, DbError> {
        let mut users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT id, email, display_name, auth_source, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(filter.skip.unwrap_or(0))
        .bind(filter.limit.unwrap_or(100))
        .fetch_all(&mut *self.db)
        .await?;

        for user in &mut users {
            user.capabilities = self.capabilities_for(user.id).await?;
        }
        Ok(users)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response, DbError> {
        let mut user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, display_name, auth_source, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        if let Some(capabilities) = &request.capabilities {
            sqlx::query("DELETE FROM user_capabilities WHERE user_id = $1")
                .bind(id)
                .execute(&mut *self.db)
                .await?;
            self.grant_capabilities(id, capabilities).await?;
        }

        user.capabilities = self.capabilities_for(id).await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
