//! Shared helpers for integration tests.

use crate::config::Config;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::secrets::SecretVault;
use crate::types::Capability;
use crate::{build_router, AppState};
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgresql://unused-in-tests".to_string(),
        admin_email: "admin@test.local".to_string(),
        ..Config::default()
    }
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let state = AppState::builder()
        .db(pool)
        .config(create_test_config())
        .secrets(SecretVault::new())
        .build();
    TestServer::new(build_router(state)).expect("Failed to build test server")
}

/// Create a user with a unique email and the given capability grants.
pub async fn create_test_user(pool: &PgPool, capabilities: Vec<Capability>) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut repo = Users::new(&mut conn);
    repo.create(&UserCreateDBRequest {
        email: format!("user-{}@test.local", Uuid::new_v4()),
        display_name: Some("Test User".to_string()),
        capabilities,
        auth_source: "test".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

/// Proxy auth header pair for the given user, matching the test config.
pub fn auth_header(user: &UserDBResponse) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-auth-user"),
        HeaderValue::from_str(&user.email).expect("Invalid header value"),
    )
}
