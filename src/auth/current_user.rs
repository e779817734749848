//! Resolving the authenticated caller.
//!
//! The service sits behind a trusted authenticating proxy which injects the
//! caller's email in a configurable header. The extractor looks the user up
//! by email and, when auto-creation is enabled, provisions unknown users
//! with the configured default capability set.

use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::Error;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::{debug, info};

async fn try_proxy_header_auth(parts: &Parts, state: &AppState) -> Result<CurrentUser, Error> {
    let config = &state.config.auth.proxy_header;
    if !config.enabled {
        return Err(Error::Unauthenticated {
            message: Some("Proxy header authentication is disabled".to_string()),
        });
    }

    let email = parts
        .headers
        .get(&config.header_name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(Error::Unauthenticated { message: None })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    if let Some(user) = users.get_by_email(email).await? {
        debug!(email, "Authenticated via proxy header");
        return Ok(user.into());
    }

    if config.auto_create_users {
        let created = users
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                display_name: None,
                capabilities: config.auto_create_capabilities.clone(),
                auth_source: "proxy-header".to_string(),
            })
            .await?;
        info!(email, "Auto-created user from proxy header");
        return Ok(created.into());
    }

    Err(Error::Unauthenticated {
        message: Some("Unknown user".to_string()),
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        try_proxy_header_auth(parts, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_user};
    use crate::secrets::SecretVault;
    use crate::types::Capability;
    use sqlx::PgPool;

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let (parts, _) = axum::http::Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn state_with(pool: PgPool, auto_create: bool) -> AppState {
        let mut config = create_test_config();
        config.auth.proxy_header.auto_create_users = auto_create;
        AppState::builder()
            .db(pool)
            .config(config)
            .secrets(SecretVault::new())
            .build()
    }

    #[test_log::test(sqlx::test)]
    async fn test_known_user_is_resolved(pool: PgPool) {
        let user = create_test_user(&pool, vec![Capability::AccessApi]).await;
        let state = state_with(pool, false);

        let mut parts = parts_with_header("x-auth-user", &user.email);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.capabilities, vec![Capability::AccessApi]);
    }

    #[test_log::test(sqlx::test)]
    async fn test_missing_header_is_unauthenticated(pool: PgPool) {
        let state = state_with(pool, false);
        let (mut parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(err, Err(Error::Unauthenticated { .. })));
    }

    #[test_log::test(sqlx::test)]
    async fn test_unknown_user_rejected_without_auto_create(pool: PgPool) {
        let state = state_with(pool, false);
        let mut parts = parts_with_header("x-auth-user", "stranger@example.com");

        let err = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(err, Err(Error::Unauthenticated { .. })));
    }

    #[test_log::test(sqlx::test)]
    async fn test_unknown_user_provisioned_with_auto_create(pool: PgPool) {
        let state = state_with(pool, true);
        let mut parts = parts_with_header("x-auth-user", "newcomer@example.com");

        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.email, "newcomer@example.com");
        assert_eq!(current.capabilities, vec![Capability::AccessApi]);
    }
}
