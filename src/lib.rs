//! # tokenctl: Per-User API Token Management
//!
//! `tokenctl` is a small control service for issuing and managing per-user
//! API tokens. A token is a client-id/client-secret pair: the client id is a
//! 32-character random string guaranteed unique across the whole store, and
//! the client secret is disclosed to the caller exactly once at issuance
//! (plus a single follow-up retrieve), with only its Argon2 hash persisted.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and PostgreSQL for persistence. Requests to the management
//! API at `/admin/api/v1/*` resolve the caller through a trusted proxy
//! header, then pass capability checks (`access-api` to hold tokens,
//! `manage-users` to act on other users) before reaching handlers. Handlers
//! talk to the database through repository interfaces; issuance runs a
//! bounded retry loop against the client id unique constraint, and freshly
//! issued secrets are parked in an in-memory one-shot vault for the single
//! follow-up disclosure.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use tokenctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = tokenctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     tokenctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
pub mod errors;
pub mod issuance;
mod openapi;
pub mod secrets;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::{tokens, users};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::openapi::ApiDoc;
use crate::secrets::SecretVault;
use axum::{
    routing::{get, post},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, instrument, Level};
pub use types::{ApiTokenId, Capability, CurrentKeyword, UserId, UserIdOrCurrent};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// One-shot slots for freshly issued client secrets
    pub secrets: SecretVault,
}

/// Get the tokenctl database migrator.
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing user with the configured email is left untouched.
/// Called during startup so a fresh deployment always has a user holding
/// `manage-users`.
#[instrument(skip(db), err)]
pub async fn create_initial_admin_user(email: &str, db: &PgPool) -> anyhow::Result<UserId> {
    let mut conn = db.acquire().await?;
    let mut repo = Users::new(&mut conn);

    if let Some(existing) = repo.get_by_email(email).await? {
        return Ok(existing.id);
    }

    let created = repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            display_name: Some("Admin".to_string()),
            capabilities: vec![Capability::AccessApi, Capability::ManageUsers],
            auth_source: "system".to_string(),
        })
        .await?;
    info!(email, "Created initial admin user");
    Ok(created.id)
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(users::create_user).get(users::list_users))
        .route(
            "/users/{user_id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route(
            "/users/{user_id}/api-tokens",
            post(tokens::create_user_token).get(tokens::list_user_tokens),
        )
        .route(
            "/users/{user_id}/api-tokens/{token_id}",
            get(tokens::get_user_token)
                .patch(tokens::update_user_token)
                .delete(tokens::delete_user_token),
        )
        .with_state(state);

    Router::new()
        .nest("/admin/api/v1", api_routes)
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()))
        .route("/healthz", get(|| async { "OK" }))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
}

/// The assembled application: router, connection pool, and configuration.
pub struct Application {
    router: Router,
    pool: PgPool,
    config: Config,
}

impl Application {
    /// Connect to the database, run migrations, seed the admin user, and
    /// build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;
        create_initial_admin_user(&config.admin_email, &pool).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .secrets(SecretVault::new())
            .build();

        Ok(Self {
            router: build_router(state),
            pool,
            config,
        })
    }

    /// Serve until the shutdown future resolves, then drain the pool.
    pub async fn serve(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.pool.close().await;
        info!("Shutdown complete");
        Ok(())
    }
}
