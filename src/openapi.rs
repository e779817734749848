//! OpenAPI document for the management API.

use crate::api::handlers;
use crate::api::models::{
    tokens::{ApiTokenCreate, ApiTokenResponse, ApiTokenUpdate},
    users::{UserCreate, UserResponse, UserUpdate},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::tokens::create_user_token,
        handlers::tokens::get_user_token,
        handlers::tokens::list_user_tokens,
        handlers::tokens::update_user_token,
        handlers::tokens::delete_user_token,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::list_users,
        handlers::users::update_user,
        handlers::users::delete_user,
    ),
    components(schemas(
        ApiTokenCreate,
        ApiTokenUpdate,
        ApiTokenResponse,
        UserCreate,
        UserUpdate,
        UserResponse,
    )),
    tags(
        (name = "api-tokens", description = "Per-user API token management"),
        (name = "users", description = "User management"),
    )
)]
pub struct ApiDoc;
