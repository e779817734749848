//! Handlers for user management routes.

use crate::api::models::users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::auth::permissions;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserFilter;
use crate::errors::{Error, Result};
use crate::types::{Capability, UserId, UserIdOrCurrent};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

fn resolve_user_id(current_user: &CurrentUser, user_id: UserIdOrCurrent) -> UserId {
    match user_id {
        UserIdOrCurrent::Current(_) => current_user.id,
        UserIdOrCurrent::Id(id) => id,
    }
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/admin/api/v1/users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 409, description = "Email already taken"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    permissions::check_capability(&current_user, Capability::ManageUsers, "users")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let user = repo.create(&data.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Fetch a user. Callers can always fetch themselves.
#[utoipa::path(
    get,
    path = "/admin/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID or 'current'")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let target = resolve_user_id(&current_user, user_id);
    permissions::check_capability_or_current_user(
        &current_user,
        Capability::ManageUsers,
        target,
        &format!("user {target}"),
    )?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let user = repo.get_by_id(target).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: target.to_string(),
    })?;
    Ok(Json(user.into()))
}

/// List users.
#[utoipa::path(
    get,
    path = "/admin/api/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 403, description = "Insufficient permissions"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    permissions::check_capability(&current_user, Capability::ManageUsers, "users")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let users = repo
        .list(&UserFilter {
            skip: Some(query.skip.unwrap_or(0).max(0)),
            limit: Some(query.limit.unwrap_or(100).clamp(0, 1000)),
        })
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Update a user's display name or capability grants.
#[utoipa::path(
    patch,
    path = "/admin/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID or 'current'")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Json(data): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    permissions::check_capability(&current_user, Capability::ManageUsers, "users")?;
    let target = resolve_user_id(&current_user, user_id);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let user = repo.update(target, &data.into()).await?;
    Ok(Json(user.into()))
}

/// Delete a user. Their tokens are removed with them.
#[utoipa::path(
    delete,
    path = "/admin/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID or 'current'")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    permissions::check_capability(&current_user, Capability::ManageUsers, "users")?;
    let target = resolve_user_id(&current_user, user_id);

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    if !repo.delete(target).await? {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: target.to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
