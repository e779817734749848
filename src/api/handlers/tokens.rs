//! Handlers for per-user API token routes.
//!
//! Every route requires the `access-api` capability. Targeting a user other
//! than the caller additionally requires `manage-users`. Tokens belonging
//! to other users are reported as not found, never as forbidden, so token
//! ids cannot be probed across accounts.

use crate::api::models::tokens::{
    ApiTokenCreate, ApiTokenResponse, ApiTokenUpdate, ListTokensQuery,
};
use crate::api::models::users::CurrentUser;
use crate::auth::permissions;
use crate::db::handlers::{ApiTokens, Repository, Users};
use crate::db::models::tokens::ApiTokenFilter;
use crate::errors::{Error, Result};
use crate::issuance;
use crate::types::{ApiTokenId, Capability, UserId, UserIdOrCurrent};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// Resolve the target user id and enforce the capability rules shared by
/// every token route.
fn resolve_target_user(current_user: &CurrentUser, user_id: UserIdOrCurrent) -> Result<UserId> {
    permissions::check_capability(current_user, Capability::AccessApi, "API tokens")?;
    let target = match user_id {
        UserIdOrCurrent::Current(_) => current_user.id,
        UserIdOrCurrent::Id(id) => id,
    };
    permissions::check_capability_or_current_user(
        current_user,
        Capability::ManageUsers,
        target,
        &format!("API tokens for user {target}"),
    )?;
    Ok(target)
}

/// Issue a new API token for a user.
///
/// The response is the only unconditional disclosure of the plaintext
/// secret; it is additionally parked for a single follow-up retrieve.
#[utoipa::path(
    post,
    path = "/admin/api/v1/users/{user_id}/api-tokens",
    params(("user_id" = String, Path, description = "User UUID or 'current'")),
    request_body = ApiTokenCreate,
    responses(
        (status = 201, description = "Token issued", body = ApiTokenResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "api-tokens"
)]
pub async fn create_user_token(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Json(data): Json<ApiTokenCreate>,
) -> Result<(StatusCode, Json<ApiTokenResponse>)> {
    let target_user_id = resolve_target_user(&current_user, user_id)?;
    let params = data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    users
        .get_by_id(target_user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: target_user_id.to_string(),
        })?;

    let mut repo = ApiTokens::new(&mut conn);
    let issued = issuance::issue_token(&mut repo, target_user_id, &params).await?;

    state.secrets.stash(current_user.id, issued.token.id, issued.secret.clone());

    let response = ApiTokenResponse::from(issued.token).with_secret(issued.secret);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a token. Includes the plaintext secret exactly once after
/// issuance, if this caller issued it and has not seen it since.
#[utoipa::path(
    get,
    path = "/admin/api/v1/users/{user_id}/api-tokens/{token_id}",
    params(
        ("user_id" = String, Path, description = "User UUID or 'current'"),
        ("token_id" = Uuid, Path, description = "Token UUID"),
    ),
    responses(
        (status = 200, description = "Token details", body = ApiTokenResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Token not found"),
    ),
    tag = "api-tokens"
)]
pub async fn get_user_token(
    State(state): State<AppState>,
    Path((user_id, token_id)): Path<(UserIdOrCurrent, ApiTokenId)>,
    current_user: CurrentUser,
) -> Result<Json<ApiTokenResponse>> {
    let target_user_id = resolve_target_user(&current_user, user_id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiTokens::new(&mut conn);

    let token = repo
        .get_for_user(target_user_id, token_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "API token".to_string(),
            id: token_id.to_string(),
        })?;

    let mut response = ApiTokenResponse::from(token);
    if let Some(secret) = state.secrets.take(current_user.id, token_id) {
        response = response.with_secret(secret);
    }
    Ok(Json(response))
}

/// List a user's tokens, newest first. Never includes secrets.
#[utoipa::path(
    get,
    path = "/admin/api/v1/users/{user_id}/api-tokens",
    params(
        ("user_id" = String, Path, description = "User UUID or 'current'"),
        ListTokensQuery,
    ),
    responses(
        (status = 200, description = "Tokens", body = Vec<ApiTokenResponse>),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found"),
    ),
    tag = "api-tokens"
)]
pub async fn list_user_tokens(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Query(query): Query<ListTokensQuery>,
) -> Result<Json<Vec<ApiTokenResponse>>> {
    let target_user_id = resolve_target_user(&current_user, user_id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    users
        .get_by_id(target_user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: target_user_id.to_string(),
        })?;

    let mut repo = ApiTokens::new(&mut conn);
    let tokens = repo
        .list(&ApiTokenFilter {
            user_id: Some(target_user_id),
            skip: Some(query.skip.unwrap_or(0).max(0)),
            limit: Some(query.limit.unwrap_or(100).clamp(0, 1000)),
        })
        .await?;

    Ok(Json(tokens.into_iter().map(ApiTokenResponse::from).collect()))
}

/// Update a token's name and expiry. No other field is mutable.
#[utoipa::path(
    patch,
    path = "/admin/api/v1/users/{user_id}/api-tokens/{token_id}",
    params(
        ("user_id" = String, Path, description = "User UUID or 'current'"),
        ("token_id" = Uuid, Path, description = "Token UUID"),
    ),
    request_body = ApiTokenUpdate,
    responses(
        (status = 200, description = "Updated token", body = ApiTokenResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Token not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "api-tokens"
)]
pub async fn update_user_token(
    State(state): State<AppState>,
    Path((user_id, token_id)): Path<(UserIdOrCurrent, ApiTokenId)>,
    current_user: CurrentUser,
    Json(data): Json<ApiTokenUpdate>,
) -> Result<Json<ApiTokenResponse>> {
    let target_user_id = resolve_target_user(&current_user, user_id)?;
    let params = data.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiTokens::new(&mut conn);

    repo.get_for_user(target_user_id, token_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "API token".to_string(),
            id: token_id.to_string(),
        })?;

    let updated = repo.update(token_id, &params.into()).await?;
    Ok(Json(ApiTokenResponse::from(updated)))
}

/// Delete a token permanently.
#[utoipa::path(
    delete,
    path = "/admin/api/v1/users/{user_id}/api-tokens/{token_id}",
    params(
        ("user_id" = String, Path, description = "User UUID or 'current'"),
        ("token_id" = Uuid, Path, description = "Token UUID"),
    ),
    responses(
        (status = 204, description = "Token deleted"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Token not found"),
    ),
    tag = "api-tokens"
)]
pub async fn delete_user_token(
    State(state): State<AppState>,
    Path((user_id, token_id)): Path<(UserIdOrCurrent, ApiTokenId)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let target_user_id = resolve_target_user(&current_user, user_id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiTokens::new(&mut conn);

    repo.get_for_user(target_user_id, token_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "API token".to_string(),
            id: token_id.to_string(),
        })?;

    repo.delete(token_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{auth_header, create_test_app, create_test_user};
    use chrono::{Months, Utc};
    use serde_json::json;
    use uuid::Uuid;

    #[test_log::test(sqlx::test)]
    async fn test_issue_token_for_self(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&user);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "laptop token"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let token: ApiTokenResponse = response.json();
        assert_eq!(token.name, "laptop token");
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.client_id.len(), 32);
        let secret = token.client_secret.expect("secret disclosed on issuance");
        assert_eq!(secret.len(), 32);
    }

    #[test_log::test(sqlx::test)]
    async fn test_default_expiry_is_a_century_out(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&user);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "long lived"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let token: ApiTokenResponse = response.json();
        let expected = Utc::now()
            .date_naive()
            .checked_add_months(Months::new(1200))
            .unwrap();
        assert_eq!(token.expires_at, expected);
    }

    #[test_log::test(sqlx::test)]
    async fn test_explicit_expiry_is_respected(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&user);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "short lived", "expires_at": "2030-06-15"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let token: ApiTokenResponse = response.json();
        assert_eq!(token.expires_at.to_string(), "2030-06-15");
    }

    #[test_log::test(sqlx::test)]
    async fn test_validation_failures(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let (name, value) = auth_header(&user);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": ""}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "a".repeat(251)}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "bad date", "expires_at": "2025-13-40"}))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test_log::test(sqlx::test)]
    async fn test_name_at_limit_accepted(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&user);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "a".repeat(250)}))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[test_log::test(sqlx::test)]
    async fn test_secret_disclosed_exactly_once_on_retrieve(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let (name, value) = auth_header(&user);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "one shot"}))
            .await;
        let issued: ApiTokenResponse = response.json();
        let secret = issued.client_secret.clone().unwrap();

        let url = format!("/admin/api/v1/users/current/api-tokens/{}", issued.id);

        let first = app.get(&url).add_header(name.clone(), value.clone()).await;
        first.assert_status_ok();
        let fetched: ApiTokenResponse = first.json();
        assert_eq!(fetched.client_secret.as_deref(), Some(secret.as_str()));

        let second = app.get(&url).add_header(name, value).await;
        second.assert_status_ok();
        let fetched: ApiTokenResponse = second.json();
        assert_eq!(fetched.client_secret, None);
    }

    #[test_log::test(sqlx::test)]
    async fn test_requires_access_api_capability(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![]).await;

        let (name, value) = auth_header(&user);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "nope"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[test_log::test(sqlx::test)]
    async fn test_cross_user_requires_manage_users(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let caller = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let target = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&caller);
        let response = app
            .post(&format!("/admin/api/v1/users/{}/api-tokens", target.id))
            .add_header(name, value)
            .json(&json!({"name": "sneaky"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[test_log::test(sqlx::test)]
    async fn test_admin_manages_other_users_tokens(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, vec![Capability::AccessApi, Capability::ManageUsers]).await;
        let target = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&admin);
        let response = app
            .post(&format!("/admin/api/v1/users/{}/api-tokens", target.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "provisioned"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let token: ApiTokenResponse = response.json();
        assert_eq!(token.user_id, target.id);

        let response = app
            .get(&format!("/admin/api/v1/users/{}/api-tokens", target.id))
            .add_header(name, value)
            .await;
        response.assert_status_ok();
        let tokens: Vec<ApiTokenResponse> = response.json();
        assert_eq!(tokens.len(), 1);
        assert!(tokens.iter().all(|t| t.client_secret.is_none()));
    }

    #[test_log::test(sqlx::test)]
    async fn test_list_pagination_bounds(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let (name, value) = auth_header(&user);

        for i in 0..3 {
            let response = app
                .post("/admin/api/v1/users/current/api-tokens")
                .add_header(name.clone(), value.clone())
                .json(&json!({"name": format!("key {i}")}))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        // An absurd limit is capped, not passed through to the store.
        let response = app
            .get("/admin/api/v1/users/current/api-tokens?limit=9999999")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let tokens: Vec<ApiTokenResponse> = response.json();
        assert_eq!(tokens.len(), 3);

        let response = app
            .get("/admin/api/v1/users/current/api-tokens?skip=1&limit=1")
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status_ok();
        let tokens: Vec<ApiTokenResponse> = response.json();
        assert_eq!(tokens.len(), 1);

        // Negative values clamp to zero instead of erroring in Postgres.
        let response = app
            .get("/admin/api/v1/users/current/api-tokens?skip=-5&limit=-1")
            .add_header(name, value)
            .await;
        response.assert_status_ok();
        let tokens: Vec<ApiTokenResponse> = response.json();
        assert!(tokens.is_empty());
    }

    #[test_log::test(sqlx::test)]
    async fn test_issue_for_unknown_user(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, vec![Capability::AccessApi, Capability::ManageUsers]).await;

        let (name, value) = auth_header(&admin);
        let response = app
            .post(&format!("/admin/api/v1/users/{}/api-tokens", Uuid::new_v4()))
            .add_header(name, value)
            .json(&json!({"name": "orphan"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(sqlx::test)]
    async fn test_update_changes_only_allowed_fields(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let (name, value) = auth_header(&user);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "before", "expires_at": "2030-01-01"}))
            .await;
        let issued: ApiTokenResponse = response.json();

        let response = app
            .patch(&format!("/admin/api/v1/users/current/api-tokens/{}", issued.id))
            .add_header(name, value)
            .json(&json!({
                "name": "after",
                "expires_at": "2031-02-02",
            }))
            .await;
        response.assert_status_ok();
        let updated: ApiTokenResponse = response.json();
        assert_eq!(updated.name, "after");
        assert_eq!(updated.expires_at.to_string(), "2031-02-02");
        assert_eq!(updated.client_id, issued.client_id);
        assert_eq!(updated.client_secret, None);

        let stored_hash = sqlx::query_scalar::<_, String>("SELECT secret_hash FROM api_tokens WHERE id = $1")
            .bind(issued.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(crate::auth::hashing::verify_secret(&issued.client_secret.unwrap(), &stored_hash).unwrap());
    }

    #[test_log::test(sqlx::test)]
    async fn test_delete_token(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let (name, value) = auth_header(&user);

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "doomed"}))
            .await;
        let issued: ApiTokenResponse = response.json();

        let url = format!("/admin/api/v1/users/current/api-tokens/{}", issued.id);
        let response = app.delete(&url).add_header(name.clone(), value.clone()).await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app.get(&url).add_header(name, value).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(sqlx::test)]
    async fn test_other_users_token_is_invisible(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;
        let owner = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let intruder = create_test_user(&pool, vec![Capability::AccessApi]).await;

        let (name, value) = auth_header(&owner);
        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .add_header(name, value)
            .json(&json!({"name": "mine"}))
            .await;
        let issued: ApiTokenResponse = response.json();

        let (name, value) = auth_header(&intruder);
        let url = format!("/admin/api/v1/users/current/api-tokens/{}", issued.id);
        let response = app.get(&url).add_header(name.clone(), value.clone()).await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = app
            .delete(&url)
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(sqlx::test)]
    async fn test_unauthenticated_request_rejected(pool: sqlx::PgPool) {
        let app = create_test_app(pool.clone()).await;

        let response = app
            .post("/admin/api/v1/users/current/api-tokens")
            .json(&json!({"name": "anonymous"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
